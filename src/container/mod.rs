//! 依赖注入容器
//!
//! - [`DependencyContainer`]：解析协议的调度者，持有全部注册表
//! - [`Factory`]：为一个类型名称产出实例
//! - [`Injector`]：构造完成后补全装配
//! - [`DefaultImplementationFinder`]：按命名约定为接口寻找默认实现

pub mod dependency_container;
pub mod factory;
pub mod finder;
pub mod injector;
mod resolution;
pub mod status;

pub use dependency_container::{ContainerStats, DependencyContainer, SingletonSetting};
pub use factory::{CallbackFactory, ConstructorInjectionFactory, Factory, FactoryFn};
pub use finder::DefaultImplementationFinder;
pub use injector::{Injector, SetterInjector};
pub use status::InjectionStatus;
