//! autowire：运行时依赖注入容器
//!
//! 给定类或接口的名称，容器解析出构造策略，自动创建构造函数需要的依赖，
//! 再通过 setter 补全装配。类型元数据在启动时注册到 [`TypeRegistry`]。
//!
//! ```ignore
//! let registry = TypeRegistry::new()
//!     .with(InterfaceBuilder::<dyn Transport>::new("mail::TransportInterface").build())
//!     .with(
//!         ClassBuilder::<SmtpTransport>::new("mail::DefaultTransport")
//!             .implements("mail::TransportInterface", |this| this as Arc<dyn Transport>)
//!             .default_constructor()
//!             .build(),
//!     );
//!
//! let container = DependencyContainer::new(Arc::new(registry));
//! let transport = container.get("mail::TransportInterface")?;
//! ```

pub mod config;
pub mod container;
pub mod errors;
pub mod logging;
pub mod reflect;

// Re-export commonly used items for convenience
pub use config::ConfigStore;
pub use container::{
    CallbackFactory, ConstructorInjectionFactory, ContainerStats, DefaultImplementationFinder, DependencyContainer,
    Factory, FactoryFn, InjectionStatus, Injector, SetterInjector, SingletonSetting,
};
pub use errors::{ContainerError, Result};
pub use logging::{init_logging, LoggingConfig};
pub use reflect::{
    Arguments, ClassBuilder, InterfaceBuilder, MethodDescriptor, Object, ParameterDescriptor, TypeDescriptor, TypeKind,
    TypeName, TypeReflector, TypeRegistry, Value,
};
