//! 测试夹具
//!
//! `fixtures::dummy` 下的接口与类按默认实现约定命名：
//! `Dummy1Interface -> DefaultDummy1`，`Dummy2Interface -> DefaultDummy2Impl`，
//! `Dummy3Interface -> NullDummy3`。`DefaultDummy4` 没有实现 `Dummy4Interface`。
#![allow(dead_code)]

use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};

use autowire::{
    ClassBuilder, ContainerError, DependencyContainer, InterfaceBuilder, MethodDescriptor, Object, ParameterDescriptor,
    TypeName, TypeReflector, TypeRegistry, Value,
};
use parking_lot::Mutex;

pub const DUMMY1_INTERFACE: &str = "fixtures::dummy::Dummy1Interface";
pub const DUMMY2_INTERFACE: &str = "fixtures::dummy::Dummy2Interface";
pub const DUMMY3_INTERFACE: &str = "fixtures::dummy::Dummy3Interface";
pub const DUMMY4_INTERFACE: &str = "fixtures::dummy::Dummy4Interface";

pub const DEFAULT_DUMMY1: &str = "fixtures::dummy::DefaultDummy1";
pub const DEFAULT_DUMMY2_IMPL: &str = "fixtures::dummy::DefaultDummy2Impl";
pub const NULL_DUMMY3: &str = "fixtures::dummy::NullDummy3";
pub const DEFAULT_DUMMY4: &str = "fixtures::dummy::DefaultDummy4";

pub const CONSTRUCTOR_INJECTION: &str = "fixtures::tests::ConstructorInjectionClass";
pub const WITH_ADDITIONAL_PARAMS: &str = "fixtures::tests::ConstructorInjectionClassWithAdditionalParams";
pub const WITH_OPTIONAL_PARAMETERS: &str = "fixtures::tests::ConstructorInjectionClassWithOptionalParameters";

pub const LOGGER_INTERFACE: &str = "fixtures::log::LoggerInterface";
pub const MAILER_INTERFACE: &str = "fixtures::mail::MailerInterface";
pub const NEWSLETTER: &str = "fixtures::mail::Newsletter";
pub const NOTIFIER_INTERFACE: &str = "fixtures::notify::NotifierInterface";
pub const DEFAULT_NOTIFIER: &str = "fixtures::notify::DefaultNotifier";

pub trait Dummy1: Send + Sync {
    fn label(&self) -> &'static str;
}

pub trait Dummy2: Send + Sync {
    fn label(&self) -> &'static str;
}

pub trait Dummy3: Send + Sync {
    fn label(&self) -> &'static str;
}

pub trait Dummy4: Send + Sync {}

#[derive(Debug, Default)]
pub struct DefaultDummy1;

impl Dummy1 for DefaultDummy1 {
    fn label(&self) -> &'static str {
        "DefaultDummy1"
    }
}

#[derive(Debug, Default)]
pub struct DefaultDummy2Impl;

impl Dummy2 for DefaultDummy2Impl {
    fn label(&self) -> &'static str {
        "DefaultDummy2Impl"
    }
}

#[derive(Debug, Default)]
pub struct NullDummy3;

impl Dummy3 for NullDummy3 {
    fn label(&self) -> &'static str {
        "NullDummy3"
    }
}

#[derive(Debug, Default)]
pub struct DefaultDummy4;

pub struct ConstructorInjectionClass {
    pub dummy1: Arc<dyn Dummy1>,
    pub dummy2: Arc<dyn Dummy2>,
    pub dummy3: Arc<dyn Dummy3>,
}

pub struct ConstructorInjectionClassWithAdditionalParams {
    pub dummy1: Arc<dyn Dummy1>,
    pub config1: Value,
    pub dummy2: Arc<dyn Dummy2>,
    pub dummy3: Arc<dyn Dummy3>,
    pub config2: Value,
}

pub struct ConstructorInjectionClassWithOptionalParameters {
    pub dummy1: Arc<dyn Dummy1>,
    pub dummy4: Option<Arc<dyn Dummy4>>,
    pub config1: Value,
}

pub trait Logger: Send + Sync {
    fn log(&self, line: &str);
    fn lines(&self) -> Vec<String>;
}

#[derive(Default)]
pub struct MemoryLogger {
    lines: Mutex<Vec<String>>,
}

impl Logger for MemoryLogger {
    fn log(&self, line: &str) {
        self.lines.lock().push(line.to_string());
    }

    fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

pub trait Mailer: Send + Sync {
    fn send(&self, to: &str) -> String;
}

#[derive(Default)]
pub struct DefaultMailer;

impl Mailer for DefaultMailer {
    fn send(&self, to: &str) -> String {
        format!("mail to {to}")
    }
}

/// 构造函数要求 mailer，另有 logger 与 mailer 两个 setter
pub struct Newsletter {
    pub mailer: Mutex<Arc<dyn Mailer>>,
    pub logger: Mutex<Option<Arc<dyn Logger>>>,
    pub mailer_setter_calls: AtomicUsize,
}

impl Newsletter {
    pub fn logger(&self) -> Option<Arc<dyn Logger>> {
        self.logger.lock().clone()
    }
}

pub trait Notifier: Send + Sync {
    fn set_logger(&self, logger: Arc<dyn Logger>);
    fn logger(&self) -> Option<Arc<dyn Logger>>;
}

#[derive(Default)]
pub struct DefaultNotifier {
    logger: Mutex<Option<Arc<dyn Logger>>>,
}

impl Notifier for DefaultNotifier {
    fn set_logger(&self, logger: Arc<dyn Logger>) {
        *self.logger.lock() = Some(logger);
    }

    fn logger(&self) -> Option<Arc<dyn Logger>> {
        self.logger.lock().clone()
    }
}

fn cast_failed(class: &str, expected: &'static str) -> ContainerError {
    ContainerError::TypeMismatch {
        class: class.into(),
        expected,
    }
}

pub fn registry() -> TypeRegistry {
    TypeRegistry::new()
        .with(InterfaceBuilder::<dyn Dummy1>::new(DUMMY1_INTERFACE).build())
        .with(InterfaceBuilder::<dyn Dummy2>::new(DUMMY2_INTERFACE).build())
        .with(InterfaceBuilder::<dyn Dummy3>::new(DUMMY3_INTERFACE).build())
        .with(InterfaceBuilder::<dyn Dummy4>::new(DUMMY4_INTERFACE).build())
        .with(
            ClassBuilder::<DefaultDummy1>::new(DEFAULT_DUMMY1)
                .implements(DUMMY1_INTERFACE, |this| this as Arc<dyn Dummy1>)
                .default_constructor()
                .build(),
        )
        .with(
            ClassBuilder::<DefaultDummy2Impl>::new(DEFAULT_DUMMY2_IMPL)
                .implements(DUMMY2_INTERFACE, |this| this as Arc<dyn Dummy2>)
                .default_constructor()
                .build(),
        )
        .with(
            ClassBuilder::<NullDummy3>::new(NULL_DUMMY3)
                .implements(DUMMY3_INTERFACE, |this| this as Arc<dyn Dummy3>)
                .default_constructor()
                .build(),
        )
        .with(ClassBuilder::<DefaultDummy4>::new(DEFAULT_DUMMY4).default_constructor().build())
        .with(
            ClassBuilder::<ConstructorInjectionClass>::new(CONSTRUCTOR_INJECTION)
                .constructor(
                    vec![
                        ParameterDescriptor::typed("dummy1", DUMMY1_INTERFACE),
                        ParameterDescriptor::typed("dummy2", DUMMY2_INTERFACE),
                        ParameterDescriptor::typed("dummy3", DUMMY3_INTERFACE),
                    ],
                    |args| {
                        Ok(ConstructorInjectionClass {
                            dummy1: args.object::<dyn Dummy1>()?,
                            dummy2: args.object::<dyn Dummy2>()?,
                            dummy3: args.object::<dyn Dummy3>()?,
                        })
                    },
                )
                .build(),
        )
        .with(
            ClassBuilder::<ConstructorInjectionClassWithAdditionalParams>::new(WITH_ADDITIONAL_PARAMS)
                .constructor(
                    vec![
                        ParameterDescriptor::typed("dummy1", DUMMY1_INTERFACE),
                        ParameterDescriptor::untyped("config1"),
                        ParameterDescriptor::typed("dummy2", DUMMY2_INTERFACE),
                        ParameterDescriptor::typed("dummy3", DUMMY3_INTERFACE),
                        ParameterDescriptor::untyped("config2"),
                    ],
                    |args| {
                        Ok(ConstructorInjectionClassWithAdditionalParams {
                            dummy1: args.object::<dyn Dummy1>()?,
                            config1: args.value(),
                            dummy2: args.object::<dyn Dummy2>()?,
                            dummy3: args.object::<dyn Dummy3>()?,
                            config2: args.value(),
                        })
                    },
                )
                .build(),
        )
        .with(
            ClassBuilder::<ConstructorInjectionClassWithOptionalParameters>::new(WITH_OPTIONAL_PARAMETERS)
                .constructor(
                    vec![
                        ParameterDescriptor::typed("dummy1", DUMMY1_INTERFACE),
                        ParameterDescriptor::typed("dummy4", DUMMY4_INTERFACE).optional(),
                        ParameterDescriptor::untyped("config1").optional(),
                    ],
                    |args| {
                        Ok(ConstructorInjectionClassWithOptionalParameters {
                            dummy1: args.object::<dyn Dummy1>()?,
                            dummy4: args.optional_object::<dyn Dummy4>()?,
                            config1: args.value(),
                        })
                    },
                )
                .build(),
        )
        .with(InterfaceBuilder::<dyn Logger>::new(LOGGER_INTERFACE).build())
        .with(
            ClassBuilder::<MemoryLogger>::new("fixtures::log::DefaultLogger")
                .implements(LOGGER_INTERFACE, |this| this as Arc<dyn Logger>)
                .default_constructor()
                .build(),
        )
        .with(InterfaceBuilder::<dyn Mailer>::new(MAILER_INTERFACE).build())
        .with(
            ClassBuilder::<DefaultMailer>::new("fixtures::mail::DefaultMailer")
                .implements(MAILER_INTERFACE, |this| this as Arc<dyn Mailer>)
                .default_constructor()
                .build(),
        )
        .with(
            ClassBuilder::<Newsletter>::new(NEWSLETTER)
                .constructor(vec![ParameterDescriptor::typed("mailer", MAILER_INTERFACE)], |args| {
                    Ok(Newsletter {
                        mailer: Mutex::new(args.object::<dyn Mailer>()?),
                        logger: Mutex::new(None),
                        mailer_setter_calls: AtomicUsize::new(0),
                    })
                })
                .setter("set_mailer", MAILER_INTERFACE, |this, mailer| {
                    let mailer = mailer
                        .cast::<dyn Mailer>()
                        .ok_or_else(|| cast_failed(NEWSLETTER, "dyn Mailer"))?;
                    *this.mailer.lock() = mailer;
                    this.mailer_setter_calls.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .setter("set_logger", LOGGER_INTERFACE, |this, logger| {
                    let logger = logger
                        .cast::<dyn Logger>()
                        .ok_or_else(|| cast_failed(NEWSLETTER, "dyn Logger"))?;
                    *this.logger.lock() = Some(logger);
                    Ok(())
                })
                // 两个参数，不是 setter
                .method(
                    "setup",
                    vec![
                        ParameterDescriptor::typed("mailer", MAILER_INTERFACE),
                        ParameterDescriptor::typed("logger", LOGGER_INTERFACE),
                    ],
                    |_, _| panic!("setup must not be called by the container"),
                )
                // 参数没有类型要求，不是 setter
                .method("set_subject", vec![ParameterDescriptor::untyped("subject")], |_, _| {
                    panic!("set_subject must not be called by the container")
                })
                .build(),
        )
        .with(
            InterfaceBuilder::<dyn Notifier>::new(NOTIFIER_INTERFACE)
                .setter("set_logger", LOGGER_INTERFACE, |this, logger| {
                    let logger = logger
                        .cast::<dyn Logger>()
                        .ok_or_else(|| cast_failed(NOTIFIER_INTERFACE, "dyn Logger"))?;
                    this.set_logger(logger);
                    Ok(())
                })
                .build(),
        )
        .with(
            ClassBuilder::<DefaultNotifier>::new(DEFAULT_NOTIFIER)
                .implements(NOTIFIER_INTERFACE, |this| this as Arc<dyn Notifier>)
                .default_constructor()
                .build(),
        )
}

pub fn container() -> DependencyContainer {
    DependencyContainer::new(Arc::new(registry()))
}

/// 两个句柄是否指向同一个分配
pub fn same_instance<T: ?Sized, U: ?Sized>(a: &Arc<T>, b: &Arc<U>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

/// 第一次查询 `paused` 是否为类时停下，等测试线程放行
///
/// `entered` 与 `released` 都是两方屏障：先等测试线程确认已停下，再等它放行。
pub struct PausingReflector {
    inner: TypeRegistry,
    paused: TypeName,
    armed: AtomicBool,
    pub entered: Barrier,
    pub released: Barrier,
}

impl PausingReflector {
    pub fn new(paused: &str) -> Self {
        Self {
            inner: registry(),
            paused: TypeName::from(paused),
            armed: AtomicBool::new(true),
            entered: Barrier::new(2),
            released: Barrier::new(2),
        }
    }
}

impl TypeReflector for PausingReflector {
    fn class_exists(&self, name: &TypeName) -> bool {
        if *name == self.paused && self.armed.swap(false, Ordering::SeqCst) {
            self.entered.wait();
            self.released.wait();
        }
        self.inner.class_exists(name)
    }

    fn interface_exists(&self, name: &TypeName) -> bool {
        self.inner.interface_exists(name)
    }

    fn is_subtype(&self, class: &TypeName, ty: &TypeName) -> bool {
        self.inner.is_subtype(class, ty)
    }

    fn constructor_parameters(&self, class: &TypeName) -> Result<Arc<[ParameterDescriptor]>, ContainerError> {
        self.inner.constructor_parameters(class)
    }

    fn public_methods(&self, name: &TypeName) -> Vec<MethodDescriptor> {
        self.inner.public_methods(name)
    }

    fn instantiate(&self, class: &TypeName, args: Vec<Value>) -> Result<Object, ContainerError> {
        self.inner.instantiate(class, args)
    }

    fn wrap(&self, class: &TypeName, value: Arc<dyn Any + Send + Sync>) -> Result<Object, ContainerError> {
        self.inner.wrap(class, value)
    }
}
