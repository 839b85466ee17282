//! `SeaORM` entities, one module per table.

pub mod api_quota;
pub mod dns_record;
pub mod domain;
pub mod health_summary;
pub mod pending_domain;
pub mod scan_result;
pub mod suspension;
