//! Rollout supervision
//!
//! After a start request is acknowledged the supervisor polls the controller
//! once per tick until the app is healthy, has crashed, or the tick budget is
//! spent.

pub mod fsm;
pub mod health;
pub mod logs;
pub mod rollback;
pub mod supervisor;
pub mod ticker;
