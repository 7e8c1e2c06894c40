mod account;
mod health_check;
mod helpers;
mod register;
