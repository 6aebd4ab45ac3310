pub mod models;
pub mod validator;
