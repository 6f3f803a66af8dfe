pub mod admin;
pub mod app_config;
pub mod constants;
pub mod db;
pub mod events;
pub mod ip;
pub mod middleware;
pub mod notice;
pub mod orm;
pub mod poll;
pub mod session;
pub mod user;
pub mod web;
