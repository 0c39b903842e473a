#![allow(dead_code)]

pub mod app;
pub mod factory;

pub use app::{default_gateway, StubGateway, TestApp};
pub use factory::Factory;
