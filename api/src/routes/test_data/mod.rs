pub mod extract_fields_route;
pub mod generate_from_cases_route;
pub mod generate_test_data_route;
pub mod supported_types_route;
pub mod test_data_request;
