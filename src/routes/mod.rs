mod auth;
mod cars;
mod health_check;

pub use auth::{login, register, whoami};
pub use cars::{create_car, delete_car, get_car, list_cars, rent_car, update_car};
pub use health_check::health_check;
