#![allow(dead_code)]

pub mod timeline;
