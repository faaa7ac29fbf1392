pub mod request_id;
pub mod response_envelope;
