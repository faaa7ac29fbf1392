pub mod agent_request;
pub mod explain_route;
pub mod generate_all_route;
pub mod generate_test_cases_route;
pub mod selenium_route;
