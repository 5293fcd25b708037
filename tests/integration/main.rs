//! Integration tests: engine, session, spreadsheets and the HTTP shell
//! exercised together through the public API of the crate.

mod api_flow;
mod mock_auth;
mod session_flow;
