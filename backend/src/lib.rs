pub mod db;
pub mod domain;
pub mod repository;
pub mod rest;
