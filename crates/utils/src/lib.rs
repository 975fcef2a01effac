pub mod logging;
pub mod response;
pub mod text;
pub mod validation;
