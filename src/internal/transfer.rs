//! 传输领域模块：分片顺序下载的会话、策略与外部协作者接口。
//!
//! 对外导出以 crate 根为准，此处仅做模块划分。

pub mod impl_traits;
pub mod structs;
pub mod traits;
