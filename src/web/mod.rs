pub mod admin;
pub mod error;
pub mod events;
pub mod register;

/// Configures the web app by adding services from each web file.
///
/// @see https://docs.rs/actix-web/4.0.1/actix_web/struct.App.html#method.configure
pub fn configure(conf: &mut actix_web::web::ServiceConfig) {
    // Descending order. Order is important.
    // Route resolution will stop at the first match.
    register::configure(conf);
    events::configure(conf);
    admin::configure(conf);
}
