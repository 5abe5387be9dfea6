#![allow(dead_code)]

pub mod jwt;
pub mod stub;
