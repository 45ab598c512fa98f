//! HTTP front end: server-rendered pages and form endpoints over the
//! inventory store.

pub mod app;
