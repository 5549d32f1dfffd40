//! 容器配置存储
//!
//! 键值对存储，值为任意 JSON 值；同一个键可以重复写入，以最后一次为准。

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::Value as ConfigValue;

use crate::errors::ContainerError;

/// 配置存储
#[derive(Debug, Default)]
pub struct ConfigStore {
    values: RwLock<HashMap<String, ConfigValue>>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入配置项，返回被覆盖的旧值
    pub fn set(&self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Option<ConfigValue> {
        let key = key.into();
        tracing::debug!("Setting config key \"{}\"", key);
        self.values.write().insert(key, value.into())
    }

    /// 读取配置项，未写入过的键返回错误
    pub fn get(&self, key: &str) -> Result<ConfigValue, ContainerError> {
        self.values
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| ContainerError::UnknownConfigKey(key.to_string()))
    }

    /// 按类型读取配置项
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<T, ContainerError> {
        let value = self.get(key)?;
        serde_json::from_value(value).map_err(|source| ContainerError::ConfigType {
            key: key.to_string(),
            expected: std::any::type_name::<T>(),
            source,
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.read().contains_key(key)
    }

    pub fn remove(&self, key: &str) -> Option<ConfigValue> {
        self.values.write().remove(key)
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.values.read().keys().cloned().collect();
        keys.sort();
        keys
    }
}
