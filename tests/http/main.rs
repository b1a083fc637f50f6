mod support;

mod auth;
mod orders;
mod products;
mod reports;
