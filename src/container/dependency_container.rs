//! 依赖注入容器
//!
//! 解析顺序（先匹配者胜出）：
//! 1. 为该名称注册的工厂回调
//! 2. 为该名称绑定的实现类，继续解析绑定的类名
//! 3. 已注册的类，使用构造函数注入工厂
//! 4. 已注册的接口，交给默认实现查找器，继续解析找到的类名
//! 5. 其他名称报 `UnknownDependency`
//!
//! 工厂产出实例后，运行为最初请求的名称注册的注入器。
//!
//! 注册表的修改（`factory`、`uses` 及对应的移除操作）持有 `revision` 写锁并递增版本号；
//! 解析结果只在版本号未变时写入工厂缓存，单例开始实例化前在读锁下登记。

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::{DashMap, DashSet};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::Value as ConfigValue;

use crate::config::ConfigStore;
use crate::container::factory::{CallbackFactory, ConstructorInjectionFactory, Factory, FactoryFn};
use crate::container::finder::DefaultImplementationFinder;
use crate::container::injector::{Injector, SetterInjector};
use crate::container::resolution::ResolutionGuard;
use crate::container::InjectionStatus;
use crate::errors::{ContainerError, Result};
use crate::logging::OperationTimer;
use crate::reflect::{Object, TypeName, TypeReflector, Value};

/// 单例设置
#[derive(Clone)]
pub enum SingletonSetting {
    /// 标记为单例
    Enabled,
    /// 标记为单例，同时注册工厂回调
    Factory(FactoryFn),
    /// 取消单例标记
    Disabled,
}

impl SingletonSetting {
    pub fn factory<F>(callback: F) -> Self
    where
        F: Fn(&DependencyContainer, Vec<Value>) -> Result<Object> + Send + Sync + 'static,
    {
        SingletonSetting::Factory(Arc::new(callback))
    }
}

impl fmt::Debug for SingletonSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SingletonSetting::Enabled => f.write_str("Enabled"),
            SingletonSetting::Factory(_) => f.write_str("Factory(..)"),
            SingletonSetting::Disabled => f.write_str("Disabled"),
        }
    }
}

/// 内部容器统计信息（原子计数器）
#[derive(Default)]
struct InnerStats {
    total_creations: AtomicUsize,
    cache_hits: AtomicUsize,
    cache_misses: AtomicUsize,
}

/// 容器统计信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerStats {
    /// 工厂实际产出实例的次数
    pub total_creations: usize,
    /// 从共享实例缓存直接返回的次数
    pub cache_hits: usize,
    /// 共享实例缓存未命中、需要创建的次数
    pub cache_misses: usize,
}

impl ContainerStats {
    /// 获取缓存命中率
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.cache_hits + self.cache_misses;
        if lookups == 0 {
            0.0
        } else {
            self.cache_hits as f64 / lookups as f64
        }
    }
}

struct ContainerInner {
    reflector: Arc<dyn TypeReflector>,
    finder: DefaultImplementationFinder,
    /// 用户注册的工厂回调
    factories: DashMap<TypeName, FactoryFn>,
    /// 名称到实现类的绑定
    bindings: DashMap<TypeName, TypeName>,
    /// 已解析的工厂缓存
    constructors: DashMap<TypeName, Arc<dyn Factory>>,
    singletons: DashMap<TypeName, bool>,
    /// 共享实例缓存，使用OnceCell确保只创建一次
    instances: DashMap<TypeName, Arc<OnceCell<Object>>>,
    /// 正在实例化的共享实例
    building: DashSet<TypeName>,
    /// 注册表版本号
    revision: RwLock<u64>,
    injectors: DashMap<TypeName, Vec<Arc<dyn Injector>>>,
    /// 查找器结果缓存
    implementations: DashMap<TypeName, Option<TypeName>>,
    config: ConfigStore,
    stats: InnerStats,
}

/// 依赖注入容器
///
/// 克隆只复制内部 `Arc`，所有克隆共享同一组注册表。
#[derive(Clone)]
pub struct DependencyContainer {
    inner: Arc<ContainerInner>,
}

impl DependencyContainer {
    /// 创建新的容器实例
    pub fn new(reflector: Arc<dyn TypeReflector>) -> Self {
        Self {
            inner: Arc::new(ContainerInner {
                finder: DefaultImplementationFinder::new(Arc::clone(&reflector)),
                reflector,
                factories: DashMap::new(),
                bindings: DashMap::new(),
                constructors: DashMap::new(),
                singletons: DashMap::new(),
                instances: DashMap::new(),
                building: DashSet::new(),
                revision: RwLock::new(0),
                injectors: DashMap::new(),
                implementations: DashMap::new(),
                config: ConfigStore::new(),
                stats: InnerStats::default(),
            }),
        }
    }

    pub fn reflector(&self) -> &Arc<dyn TypeReflector> {
        &self.inner.reflector
    }

    pub fn finder(&self) -> &DefaultImplementationFinder {
        &self.inner.finder
    }

    /// 创建实例，无法解析时返回错误
    pub fn create(&self, name: impl Into<TypeName>) -> Result<Object> {
        self.create_with(name, Vec::new())
    }

    /// 带位置参数创建实例
    ///
    /// 标记为单例的名称只在第一次实例化时使用传入参数，之后返回缓存的实例。
    pub fn create_with(&self, name: impl Into<TypeName>, args: Vec<Value>) -> Result<Object> {
        let name = name.into().normalized();
        if self.is_singleton(&name) {
            return self.shared_instance(&name, args);
        }
        self.build(&name, args)
    }

    /// 同 [`create`](Self::create)，失败时返回 `None`
    pub fn try_create(&self, name: impl Into<TypeName>) -> Option<Object> {
        self.try_create_with(name, Vec::new())
    }

    pub fn try_create_with(&self, name: impl Into<TypeName>, args: Vec<Value>) -> Option<Object> {
        let name = name.into().normalized();
        match self.create_with(&name, args) {
            Ok(object) => Some(object),
            Err(err) => {
                tracing::debug!("Can not create \"{}\": {}", name, err);
                None
            }
        }
    }

    /// 获取共享实例
    ///
    /// 每个名称第一次调用时创建并缓存，之后总是返回同一个实例，与单例标记无关。
    pub fn get(&self, name: impl Into<TypeName>) -> Result<Object> {
        let name = name.into().normalized();
        self.shared_instance(&name, Vec::new())
    }

    /// 同 [`get`](Self::get)，失败时返回 `None`
    pub fn try_get(&self, name: impl Into<TypeName>) -> Option<Object> {
        let name = name.into().normalized();
        match self.get(&name) {
            Ok(object) => Some(object),
            Err(err) => {
                tracing::debug!("Can not get \"{}\": {}", name, err);
                None
            }
        }
    }

    /// 设置单例标记，可同时注册工厂回调
    pub fn singleton(&self, name: impl Into<TypeName>, setting: SingletonSetting) -> Result<&Self> {
        let name = name.into().normalized();
        match setting {
            SingletonSetting::Enabled => {
                self.inner.singletons.insert(name, true);
            }
            SingletonSetting::Factory(callback) => {
                self.register_factory(&name, callback, true)?;
            }
            SingletonSetting::Disabled => {
                self.inner.singletons.insert(name, false);
            }
        }
        Ok(self)
    }

    /// 注册工厂回调
    ///
    /// 已实例化的单例不能再更换工厂。
    pub fn factory<F>(&self, name: impl Into<TypeName>, callback: F) -> Result<&Self>
    where
        F: Fn(&DependencyContainer, Vec<Value>) -> Result<Object> + Send + Sync + 'static,
    {
        let name = name.into().normalized();
        self.register_factory(&name, Arc::new(callback), false)?;
        Ok(self)
    }

    /// 移除工厂回调，返回是否存在
    pub fn remove_factory(&self, name: impl Into<TypeName>) -> Result<bool> {
        let name = name.into().normalized();
        let mut revision = self.inner.revision.write();
        self.ensure_unlocked(&name)?;
        let removed = self.inner.factories.remove(&name).is_some();
        self.invalidate(&name, &mut revision);
        Ok(removed)
    }

    /// 把名称绑定到实现类
    pub fn uses(&self, name: impl Into<TypeName>, class: impl Into<TypeName>) -> &Self {
        let name = name.into().normalized();
        let class = class.into().normalized();
        tracing::debug!("Binding \"{}\" to \"{}\"", name, class);
        let mut revision = self.inner.revision.write();
        self.inner.bindings.insert(name.clone(), class);
        self.invalidate(&name, &mut revision);
        self
    }

    /// 移除绑定，返回原来绑定的类
    pub fn remove_binding(&self, name: impl Into<TypeName>) -> Option<TypeName> {
        let name = name.into().normalized();
        let mut revision = self.inner.revision.write();
        let removed = self.inner.bindings.remove(&name).map(|(_, class)| class);
        self.invalidate(&name, &mut revision);
        removed
    }

    /// 读取配置项
    pub fn config(&self, key: &str) -> Result<ConfigValue> {
        self.inner.config.get(key)
    }

    /// 写入配置项，以最后一次写入为准
    pub fn set_config(&self, key: impl Into<String>, value: impl Into<ConfigValue>) -> &Self {
        self.inner.config.set(key, value);
        self
    }

    /// 按类型读取配置项
    pub fn config_as<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        self.inner.config.get_as(key)
    }

    pub fn config_store(&self) -> &ConfigStore {
        &self.inner.config
    }

    /// 把回调中构造的值包装为 `class` 的实例
    pub fn wrap<T: Any + Send + Sync>(&self, class: impl Into<TypeName>, value: T) -> Result<Object> {
        let class = class.into().normalized();
        self.inner.reflector.wrap(&class, Arc::new(value))
    }

    /// 为名称追加自定义注入器，在默认的 setter 注入器之后运行
    pub fn add_injector(&self, name: impl Into<TypeName>, injector: Arc<dyn Injector>) -> &Self {
        let name = name.into().normalized();
        self.inner
            .injectors
            .entry(name.clone())
            .or_insert_with(|| default_injectors(&name))
            .push(injector);
        self
    }

    pub fn is_singleton(&self, name: &TypeName) -> bool {
        let name = name.normalized();
        self.inner.singletons.get(&name).is_some_and(|flag| *flag)
    }

    /// 名称是否已有共享实例
    pub fn is_instantiated(&self, name: &TypeName) -> bool {
        let name = name.normalized();
        self.inner
            .instances
            .get(&name)
            .is_some_and(|cell| cell.get().is_some())
    }

    /// 获取容器统计信息
    pub fn stats(&self) -> ContainerStats {
        ContainerStats {
            total_creations: self.inner.stats.total_creations.load(Ordering::Relaxed),
            cache_hits: self.inner.stats.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.inner.stats.cache_misses.load(Ordering::Relaxed),
        }
    }

    fn id(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }

    /// 调用方需持有 `revision` 写锁
    fn ensure_unlocked(&self, name: &TypeName) -> Result<()> {
        let started = self.is_instantiated(name) || self.inner.building.contains(name);
        if self.is_singleton(name) && started {
            return Err(ContainerError::LockedSingletonMutation(name.clone()));
        }
        Ok(())
    }

    /// 清除工厂缓存并递增版本号
    fn invalidate(&self, name: &TypeName, revision: &mut u64) {
        self.inner.constructors.remove(name);
        *revision += 1;
    }

    fn register_factory(&self, name: &TypeName, callback: FactoryFn, singleton: bool) -> Result<()> {
        let mut revision = self.inner.revision.write();
        self.ensure_unlocked(name)?;
        tracing::debug!("Registering factory for \"{}\"", name);
        self.inner.factories.insert(name.clone(), callback);
        if singleton {
            self.inner.singletons.insert(name.clone(), true);
        }
        self.invalidate(name, &mut revision);
        Ok(())
    }

    /// 登记开始实例化，之后不能再更换该单例的工厂
    fn claim(&self, name: &TypeName) {
        let _revision = self.inner.revision.read();
        self.inner.building.insert(name.clone());
    }

    /// 版本号未变时写入工厂缓存，并发解析同一名称时只保留第一个
    fn cache_factory(&self, name: TypeName, factory: Arc<dyn Factory>, resolved_at: u64) -> Arc<dyn Factory> {
        let revision = self.inner.revision.read();
        if *revision != resolved_at {
            tracing::debug!("Registrations changed while resolving \"{}\", not caching", name);
            return factory;
        }
        Arc::clone(self.inner.constructors.entry(name).or_insert(factory).value())
    }

    /// 共享实例：`get` 与单例 `create` 共用同一个缓存
    fn shared_instance(&self, name: &TypeName, args: Vec<Value>) -> Result<Object> {
        let existing = self.inner.instances.get(name).map(|cell| Arc::clone(cell.value()));
        let cell = match existing {
            Some(cell) => cell,
            None => Arc::clone(
                self.inner
                    .instances
                    .entry(name.clone())
                    .or_insert_with(|| Arc::new(OnceCell::new()))
                    .value(),
            ),
        };

        if let Some(object) = cell.get() {
            self.inner.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
            tracing::trace!("Using cached instance of \"{}\"", name);
            return Ok(object.clone());
        }

        // 在同一线程上重入 OnceCell 的初始化会死锁，先检测循环
        ResolutionGuard::check(self.id(), name)?;

        let mut created = false;
        let object = cell
            .get_or_try_init(|| {
                created = true;
                self.claim(name);
                self.build(name, args)
            })
            .map_err(|err| {
                self.inner.building.remove(name);
                err
            })?;

        if created {
            self.inner.building.remove(name);
            self.inner.stats.cache_misses.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("Cached shared instance of \"{}\"", name);
        } else {
            self.inner.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
        }
        Ok(object.clone())
    }

    /// 创建新实例并运行注入器
    fn build(&self, name: &TypeName, args: Vec<Value>) -> Result<Object> {
        let _guard = ResolutionGuard::enter(self.id(), name)?;
        let timer = OperationTimer::new("create", name);

        let result = self.resolve_factory(name).and_then(|factory| {
            let mut status = InjectionStatus::new();
            let object = factory.create(self, &mut status, args)?;
            self.inner.stats.total_creations.fetch_add(1, Ordering::Relaxed);

            for injector in self.injectors_for(name) {
                injector.inject(self, &object, &mut status)?;
            }
            Ok(object)
        });

        timer.finish(result.is_ok());
        result
    }

    /// 按解析顺序找到负责创建 `requested` 的工厂
    fn resolve_factory(&self, requested: &TypeName) -> Result<Arc<dyn Factory>> {
        let resolved_at = *self.inner.revision.read();
        let mut current = requested.clone();
        let mut visited: Vec<TypeName> = Vec::new();

        loop {
            if let Some(factory) = self.inner.constructors.get(&current) {
                return Ok(Arc::clone(factory.value()));
            }

            if visited.contains(&current) {
                visited.push(current);
                return Err(ContainerError::CircularDependency { chain: visited });
            }
            visited.push(current.clone());

            let callback = self
                .inner
                .factories
                .get(&current)
                .map(|callback| Arc::clone(callback.value()));
            if let Some(callback) = callback {
                tracing::debug!("Required dependency \"{}\" is created by a registered factory", current);
                let factory: Arc<dyn Factory> = Arc::new(CallbackFactory::new(current.clone(), callback));
                return Ok(self.cache_factory(current, factory, resolved_at));
            }

            let bound = self.inner.bindings.get(&current).map(|class| class.value().clone());
            if let Some(bound) = bound {
                tracing::debug!("Required dependency \"{}\" is bound to \"{}\"", current, bound);
                current = bound;
                continue;
            }

            if self.inner.reflector.class_exists(&current) {
                tracing::debug!("Required dependency \"{}\" is a class, try to create it", current);
                let factory: Arc<dyn Factory> = Arc::new(ConstructorInjectionFactory::new(current.clone()));
                return Ok(self.cache_factory(current, factory, resolved_at));
            }

            if self.inner.reflector.interface_exists(&current) {
                match self.default_implementation(&current) {
                    Some(class) => {
                        tracing::debug!(
                            "Required dependency \"{}\" is fulfilled by default class \"{}\"",
                            current,
                            class
                        );
                        current = class;
                        continue;
                    }
                    None => return Err(ContainerError::NoDefaultImplementation(current)),
                }
            }

            return Err(ContainerError::UnknownDependency(current));
        }
    }

    fn default_implementation(&self, interface: &TypeName) -> Option<TypeName> {
        if let Some(found) = self.inner.implementations.get(interface) {
            return found.value().clone();
        }
        let found = self.inner.finder.find_implementation(interface);
        self.inner.implementations.insert(interface.clone(), found.clone());
        found
    }

    fn injectors_for(&self, name: &TypeName) -> Vec<Arc<dyn Injector>> {
        if let Some(injectors) = self.inner.injectors.get(name) {
            return injectors.value().clone();
        }
        self.inner
            .injectors
            .entry(name.clone())
            .or_insert_with(|| default_injectors(name))
            .value()
            .clone()
    }
}

fn default_injectors(name: &TypeName) -> Vec<Arc<dyn Injector>> {
    vec![Arc::new(SetterInjector::new(name.clone()))]
}

impl fmt::Debug for DependencyContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyContainer")
            .field("factories", &self.inner.factories.len())
            .field("bindings", &self.inner.bindings.len())
            .field("instances", &self.inner.instances.len())
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
