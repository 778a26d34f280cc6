//! SQL 控制台公共模块
//!
//! 提供各组件共享的基础设施：
//! - 配置加载
//! - 统一错误类型与响应格式
//! - 请求模型与参数校验
//! - 中间件（请求 ID、会话 Cookie）

pub mod config;
pub mod errors;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod response;
pub mod utils;
