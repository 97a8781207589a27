//! 客户端会话存储
//!
//! 用显式的存储对象替代页面之间共享的浏览器存储：
//! - 会话级（每个标签页独立，关闭即丢失）
//! - 持久级（同一浏览器配置下跨页面保留，落盘为 JSON 文件）
//!
//! 每个键都有固定的名称、作用域和值类型

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 会话存储错误
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("读写会话文件失败 ({path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("会话值 {key} 格式错误: {source}")]
    Value {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// 键的作用域
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// 单个标签页内有效
    Session,
    /// 跨页面保留
    Persistent,
}

/// 带类型的存储键
#[derive(Debug)]
pub struct Key<T> {
    pub name: &'static str,
    pub scope: Scope,
    _value: PhantomData<fn() -> T>,
}

impl<T> Key<T> {
    pub const fn new(name: &'static str, scope: Scope) -> Self {
        Self {
            name,
            scope,
            _value: PhantomData,
        }
    }
}

/// 购物车页面的商品数量
pub const CART_QUANTITY: Key<u32> = Key::new("cartQuantity", Scope::Session);
/// 购物车页面是否勾选了服务条款
pub const TERMS_ACCEPTED: Key<bool> = Key::new("termsAccepted", Scope::Session);
/// 结账流程的购物车数量
pub const CHECKOUT_CART_COUNT: Key<u32> = Key::new("checkoutCartCount", Scope::Persistent);
/// 结账流程是否同意协议
pub const CHECKOUT_AGREED: Key<bool> = Key::new("checkoutAgreed", Scope::Persistent);
/// 结账流程填写的邮箱
pub const CHECKOUT_EMAIL: Key<String> = Key::new("checkoutEmail", Scope::Persistent);

/// 客户端存储
#[derive(Debug)]
pub struct ClientStore {
    path: PathBuf,
    session: Map<String, Value>,
    persistent: Map<String, Value>,
}

impl ClientStore {
    /// 打开一个新的"标签页"：会话级为空，持久级从文件读取
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let path = path.as_ref().to_path_buf();
        let persistent = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).map_err(|source| SessionError::Value {
                key: "<file>",
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(source) => {
                return Err(SessionError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        Ok(Self {
            path,
            session: Map::new(),
            persistent,
        })
    }

    pub fn get<T: DeserializeOwned>(&self, key: &Key<T>) -> Result<Option<T>, SessionError> {
        self.scope(key.scope)
            .get(key.name)
            .cloned()
            .map(|value| {
                serde_json::from_value(value).map_err(|source| SessionError::Value {
                    key: key.name,
                    source,
                })
            })
            .transpose()
    }

    /// 写入值；持久级键立即落盘
    pub fn set<T: Serialize>(&mut self, key: &Key<T>, value: &T) -> Result<(), SessionError> {
        let value = serde_json::to_value(value).map_err(|source| SessionError::Value {
            key: key.name,
            source,
        })?;
        self.scope_mut(key.scope).insert(key.name.to_string(), value);
        self.flush_if_persistent(key.scope)
    }

    pub fn remove<T>(&mut self, key: &Key<T>) -> Result<(), SessionError> {
        self.scope_mut(key.scope).remove(key.name);
        self.flush_if_persistent(key.scope)
    }

    fn scope(&self, scope: Scope) -> &Map<String, Value> {
        match scope {
            Scope::Session => &self.session,
            Scope::Persistent => &self.persistent,
        }
    }

    fn scope_mut(&mut self, scope: Scope) -> &mut Map<String, Value> {
        match scope {
            Scope::Session => &mut self.session,
            Scope::Persistent => &mut self.persistent,
        }
    }

    fn flush_if_persistent(&self, scope: Scope) -> Result<(), SessionError> {
        if scope != Scope::Persistent {
            return Ok(());
        }
        let content =
            serde_json::to_string_pretty(&self.persistent).map_err(|source| SessionError::Value {
                key: "<file>",
                source,
            })?;
        std::fs::write(&self.path, content).map_err(|source| SessionError::Io {
            path: self.path.display().to_string(),
            source,
        })
    }
}
