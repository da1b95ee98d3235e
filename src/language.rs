//! The entry point applications use: compile expressions and predicates by
//! text, with the compiled forms kept in bounded caches.

use std::sync::Arc;

use log::{debug, info, trace};
use thiserror::Error;

use crate::{
    cache::{CacheStatistics, ExpressionCache},
    evaluator::{Expression, Predicate},
    lexer::{has_escape_token, has_function_start_token},
    parser::{
        SimpleIllegalSyntaxError, has_init_block, parse_expression, parse_expression_code, parse_predicate,
        parse_predicate_code,
    },
};

/// Largest accepted `cache_max_size`. Each cache reserves room for its
/// full capacity when it is created.
pub const MAX_CACHE_SIZE: usize = 1 << 20;

/// A [`SimpleLanguageConfig`] rejected by [`SimpleLanguage::init`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("cache_max_size {size} exceeds the maximum of {max}")]
    CacheTooLarge { size: usize, max: usize },
}

/// Settings of a [`SimpleLanguage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleLanguageConfig {
    /// Entries kept per cache. Zero disables caching.
    pub cache_max_size: usize,
    /// Whether `\n`, `\t`, `\r` and `\}` are unescaped.
    pub allow_escape: bool,
}

impl Default for SimpleLanguageConfig {
    fn default() -> Self {
        SimpleLanguageConfig {
            cache_max_size: 1000,
            allow_escape: true,
        }
    }
}

/// What [`SimpleLanguage::create_code`] should treat the text as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeKind {
    Expression,
    Predicate,
}

/// Hit and miss counters of both caches.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LanguageStatistics {
    pub expressions: CacheStatistics,
    pub predicates: CacheStatistics,
}

/// Compiles simple expressions and predicates.
///
/// ```
/// use simple_lang::{Exchange, SimpleLanguage, Value};
///
/// let language = SimpleLanguage::default();
/// let expression = language.create_expression("Hello ${body}").unwrap();
/// let mut exchange = Exchange::new("World");
/// assert_eq!(expression.evaluate(&mut exchange).unwrap(), Value::from("Hello World"));
/// ```
///
/// Caches are sized by [`SimpleLanguage::init`], created by
/// [`SimpleLanguage::start`] and dropped by [`SimpleLanguage::stop`].
/// [`SimpleLanguage::new`] runs `init` and `start` right away.
pub struct SimpleLanguage {
    config: SimpleLanguageConfig,
    // capacity accepted by the last init
    cache_size: usize,
    expressions: ExpressionCache<Expression>,
    predicates: ExpressionCache<Predicate>,
}

impl Default for SimpleLanguage {
    fn default() -> Self {
        let mut language = SimpleLanguage::stopped(SimpleLanguageConfig::default());
        language.cache_size = language.config.cache_max_size;
        language.start();
        language
    }
}

impl SimpleLanguage {
    /// Validate the configuration and start the language.
    pub fn new(config: SimpleLanguageConfig) -> Result<Self, ConfigError> {
        let mut language = SimpleLanguage::stopped(config);
        language.init()?;
        language.start();
        Ok(language)
    }

    fn stopped(config: SimpleLanguageConfig) -> Self {
        SimpleLanguage {
            config,
            cache_size: 0,
            expressions: ExpressionCache::new(0),
            predicates: ExpressionCache::new(0),
        }
    }

    pub fn config(&self) -> &SimpleLanguageConfig {
        &self.config
    }

    /// Check the configuration and settle the cache size used by the next
    /// [`SimpleLanguage::start`]. A rejected configuration leaves the
    /// previous size in place.
    pub fn init(&mut self) -> Result<(), ConfigError> {
        let size = self.config.cache_max_size;
        if size > MAX_CACHE_SIZE {
            return Err(ConfigError::CacheTooLarge {
                size,
                max: MAX_CACHE_SIZE,
            });
        }
        if size == 0 {
            debug!("Simple language caching is disabled");
        } else {
            debug!("Simple language cache size: {}", size);
        }
        self.cache_size = size;
        Ok(())
    }

    /// Create empty caches of the size settled by [`SimpleLanguage::init`].
    pub fn start(&mut self) {
        self.expressions = ExpressionCache::new(self.cache_size);
        self.predicates = ExpressionCache::new(self.cache_size);
    }

    /// Log the cache counters and clear both caches.
    pub fn stop(&mut self) {
        let stats = self.cache_statistics();
        if self.expressions.is_enabled() {
            info!(
                "Clearing simple language expression cache[size={}, hits={}, misses={}, evicted={}]",
                stats.expressions.size, stats.expressions.hits, stats.expressions.misses, stats.expressions.evictions
            );
        }
        if self.predicates.is_enabled() {
            info!(
                "Clearing simple language predicate cache[size={}, hits={}, misses={}, evicted={}]",
                stats.predicates.size, stats.predicates.hits, stats.predicates.misses, stats.predicates.evictions
            );
        }
        self.expressions.clear();
        self.predicates.clear();
    }

    pub fn cache_statistics(&self) -> LanguageStatistics {
        LanguageStatistics {
            expressions: self.expressions.statistics(),
            predicates: self.predicates.statistics(),
        }
    }

    /// Compile a template expression, reusing an earlier compilation of the same text.
    pub fn create_expression(&self, text: &str) -> Result<Arc<Expression>, SimpleIllegalSyntaxError> {
        if let Some(expression) = self.expressions.get(text) {
            trace!("expression cache hit: {}", text);
            return Ok(expression);
        }

        let expression = if is_plain_text(text) {
            // nothing to parse
            Expression::constant(text)
        } else {
            parse_expression(text, self.config.allow_escape)?
        };

        let expression = Arc::new(expression);
        self.expressions.insert(text, Arc::clone(&expression));
        Ok(expression)
    }

    /// Compile a predicate, reusing an earlier compilation of the same text.
    pub fn create_predicate(&self, text: &str) -> Result<Arc<Predicate>, SimpleIllegalSyntaxError> {
        if let Some(predicate) = self.predicates.get(text) {
            trace!("predicate cache hit: {}", text);
            return Ok(predicate);
        }
        let predicate = Arc::new(parse_predicate(text, self.config.allow_escape)?);
        self.predicates.insert(text, Arc::clone(&predicate));
        Ok(predicate)
    }

    /// Emit source code for an expression or predicate. Not cached.
    pub fn create_code(&self, text: &str, kind: CodeKind) -> Result<String, SimpleIllegalSyntaxError> {
        match kind {
            CodeKind::Expression => parse_expression_code(text, self.config.allow_escape),
            CodeKind::Predicate => parse_predicate_code(text, self.config.allow_escape),
        }
    }

    /// Whether the text contains a function and so is not plain text.
    pub fn has_simple_function(text: &str) -> bool {
        has_function_start_token(text)
    }
}

fn is_plain_text(text: &str) -> bool {
    !has_function_start_token(text) && !has_escape_token(text) && !has_init_block(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{evaluator::Exchange, value::Value};

    #[test]
    fn test_plain_text_skips_parsing() {
        let language = SimpleLanguage::default();
        let expression = language.create_expression("a ? b : c").unwrap();
        assert!(matches!(*expression, Expression::Constant(_)));
        let mut exchange = Exchange::default();
        assert_eq!(expression.evaluate(&mut exchange).unwrap(), Value::from("a ? b : c"));
    }

    #[test]
    fn test_second_lookup_is_a_hit() {
        let language = SimpleLanguage::default();
        let first = language.create_expression("${body}").unwrap();
        let second = language.create_expression("${body}").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        let stats = language.cache_statistics().expressions;
        assert_eq!((stats.hits, stats.misses), (1, 1));
    }

    #[test]
    fn test_stop_clears_caches() {
        let mut language = SimpleLanguage::default();
        language.create_predicate("${body} == 'x'").unwrap();
        assert_eq!(language.cache_statistics().predicates.size, 1);
        language.stop();
        assert_eq!(language.cache_statistics().predicates, CacheStatistics {
            capacity: 1000,
            ..CacheStatistics::default()
        });
    }

    #[test]
    fn test_init_settles_cache_size_for_start() {
        let mut language = SimpleLanguage::default();
        language.config.cache_max_size = 5;
        language.start();
        assert_eq!(language.cache_statistics().expressions.capacity, 1000);

        language.init().unwrap();
        language.start();
        assert_eq!(language.cache_statistics().expressions.capacity, 5);
    }

    #[test]
    fn test_rejected_init_keeps_previous_size() {
        let mut language = SimpleLanguage::default();
        language.config.cache_max_size = MAX_CACHE_SIZE + 1;
        assert_eq!(
            language.init(),
            Err(ConfigError::CacheTooLarge {
                size: MAX_CACHE_SIZE + 1,
                max: MAX_CACHE_SIZE,
            })
        );
        language.start();
        assert_eq!(language.cache_statistics().predicates.capacity, 1000);
    }

    #[test]
    fn test_has_simple_function() {
        assert!(SimpleLanguage::has_simple_function("Hi ${body}"));
        assert!(SimpleLanguage::has_simple_function("$simple{body}"));
        assert!(!SimpleLanguage::has_simple_function("Hi there"));
    }
}
