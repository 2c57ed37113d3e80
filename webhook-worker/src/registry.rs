//! 处理器注册表（HandlerRegistry）
//!
//! 以小写归一化后的 source 为键，提供 O(1) 的处理器查找。
//! 同一 source 注册多次时，按迭代顺序后者覆盖前者（last-wins），不视为错误。
//!
use crate::handler::WebhookHandler;
use std::collections::HashMap;
use std::sync::Arc;

/// 归一化 source：与区域设置无关的小写转换
pub fn normalize_source(source: &str) -> String {
    source.to_lowercase()
}

#[derive(Clone, Default)]
pub struct HandlerRegistry {
    by_source: HashMap<String, Arc<dyn WebhookHandler>>,
}

impl HandlerRegistry {
    pub fn new<'a, I>(handlers: I) -> Self
    where
        I: IntoIterator<Item = &'a Arc<dyn WebhookHandler>>,
    {
        let mut by_source: HashMap<String, Arc<dyn WebhookHandler>> = HashMap::new();

        for h in handlers {
            by_source.insert(normalize_source(h.source()), h.clone());
        }

        Self { by_source }
    }

    pub fn get(&self, source: &str) -> Option<&Arc<dyn WebhookHandler>> {
        self.by_source.get(&normalize_source(source))
    }

    pub fn contains(&self, source: &str) -> bool {
        self.get(source).is_some()
    }

    pub fn len(&self) -> usize {
        self.by_source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_source.is_empty()
    }
}
