pub mod controllers;
pub mod migrations;
pub mod models;
pub mod routes;
pub mod selftest;
