//! PyO3 bindings for the liquidity signal pipeline.
//!
//! Exposes the Rust pipeline to the Python message handlers:
//! - Schema validation (default schema or a Python callable)
//! - Liquidity scoring
//! - Batch processing with statistics
//! - Tracing setup

use pyo3::create_exception;
use pyo3::exceptions::{PyOSError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyDict, PyFloat, PyInt, PyList, PyString, PyTuple};

use liquidity_core::config::{LoggingConfig, ScoringConfig};
use liquidity_core::logging::init_tracing;
use liquidity_core::{
    fields, DiagnosticSink, Error, LiquidityResult, Message, TracingSink, ValidatedMessage,
};
use liquidity_processor::BatchStats;
use liquidity_scoring::LiquidityScorer as RustLiquidityScorer;
use liquidity_validation::{MarketDataSchema, SchemaPredicate};
use serde_json::{Number, Value};

create_exception!(liquidity_signal_core, ValidationError, PyValueError);
create_exception!(liquidity_signal_core, CoercionError, PyValueError);

// ============================================================================
// Conversions
// ============================================================================
//
// The pipeline reads a JSON view of each dict. The view is lossy and is only
// used for the schema check and scoring; results are always built from a copy
// of the caller's dict.

fn to_py_err(err: Error) -> PyErr {
    match &err {
        Error::Validation { .. } => ValidationError::new_err(err.to_string()),
        Error::Coercion { .. } => CoercionError::new_err(err.to_string()),
        Error::Io(_) => PyOSError::new_err(err.to_string()),
        _ => PyValueError::new_err(err.to_string()),
    }
}

fn py_to_value(obj: &Bound<'_, PyAny>) -> PyResult<Value> {
    if obj.is_none() {
        return Ok(Value::Null);
    }
    // bool is a subclass of int, check it first
    if let Ok(b) = obj.downcast::<PyBool>() {
        return Ok(Value::Bool(b.is_true()));
    }
    if obj.is_instance_of::<PyInt>() {
        if let Ok(i) = obj.extract::<i64>() {
            return Ok(Value::from(i));
        }
        if let Ok(u) = obj.extract::<u64>() {
            return Ok(Value::from(u));
        }
        return Ok(Value::String(obj.str()?.to_string()));
    }
    if let Ok(f) = obj.downcast::<PyFloat>() {
        // JSON has no inf/nan; carry the spelling the float coercion accepts.
        return Ok(match Number::from_f64(f.value()) {
            Some(n) => Value::Number(n),
            None => Value::String(obj.repr()?.to_string()),
        });
    }
    if let Ok(dict) = obj.downcast::<PyDict>() {
        return dict_to_message(dict).map(Value::Object);
    }
    if let Ok(list) = obj.downcast::<PyList>() {
        return list
            .iter()
            .map(|item| py_to_value(&item))
            .collect::<PyResult<Vec<_>>>()
            .map(Value::Array);
    }
    if let Ok(tuple) = obj.downcast::<PyTuple>() {
        return tuple
            .iter()
            .map(|item| py_to_value(&item))
            .collect::<PyResult<Vec<_>>>()
            .map(Value::Array);
    }
    if let Ok(s) = obj.downcast::<PyString>() {
        return Ok(Value::String(s.to_cow()?.into_owned()));
    }
    Ok(Value::String(obj.str()?.to_string()))
}

fn key_to_string(key: &Bound<'_, PyAny>) -> PyResult<String> {
    match key.downcast::<PyString>() {
        Ok(s) => Ok(s.to_cow()?.into_owned()),
        Err(_) => Ok(key.str()?.to_string()),
    }
}

fn dict_to_message(dict: &Bound<'_, PyDict>) -> PyResult<Message> {
    let mut message = Message::new();
    for (key, value) in dict.iter() {
        message.insert(key_to_string(&key)?, py_to_value(&value)?);
    }
    Ok(message)
}

fn is_builtin_value(obj: &Bound<'_, PyAny>) -> bool {
    obj.is_none()
        || obj.is_instance_of::<PyInt>()
        || obj.is_instance_of::<PyFloat>()
        || obj.is_instance_of::<PyString>()
        || obj.is_instance_of::<PyList>()
        || obj.is_instance_of::<PyTuple>()
        || obj.is_instance_of::<PyDict>()
}

/// Convert a scored field, passing other numeric types (Decimal, numpy
/// scalars) through `int()` / `float()` first.
fn scored_value(field: &str, obj: &Bound<'_, PyAny>) -> PyResult<Value> {
    if is_builtin_value(obj) {
        return py_to_value(obj);
    }
    let py = obj.py();
    let converted = match field {
        fields::AVG_VOLUME => py.get_type_bound::<PyInt>().call1((obj,)),
        fields::TURNOVER_RATIO => py.get_type_bound::<PyFloat>().call1((obj,)),
        _ => return py_to_value(obj),
    };
    match converted {
        Ok(number) => py_to_value(&number),
        Err(_) => py_to_value(obj),
    }
}

/// JSON view of a top-level message dict.
fn message_view(dict: &Bound<'_, PyDict>) -> PyResult<Message> {
    let mut view = Message::new();
    for (key, value) in dict.iter() {
        let key = key_to_string(&key)?;
        let value = scored_value(&key, &value)?;
        view.insert(key, value);
    }
    Ok(view)
}

fn value_to_py(py: Python<'_>, value: &Value) -> PyResult<PyObject> {
    Ok(match value {
        Value::Null => py.None(),
        Value::Bool(b) => b.into_py(py),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.into_py(py)
            } else if let Some(u) = n.as_u64() {
                u.into_py(py)
            } else {
                n.as_f64().unwrap_or(f64::NAN).into_py(py)
            }
        }
        Value::String(s) => s.as_str().into_py(py),
        Value::Array(items) => {
            let list = PyList::empty_bound(py);
            for item in items {
                list.append(value_to_py(py, item)?)?;
            }
            list.into_py(py)
        }
        Value::Object(map) => {
            let dict = PyDict::new_bound(py);
            for (key, item) in map {
                dict.set_item(key, value_to_py(py, item)?)?;
            }
            dict.into_py(py)
        }
    })
}

/// Copy of `message` with the two computed keys set.
///
/// Existing keys keep their position; the score stays a float even when it
/// is not finite.
fn enriched_dict<'py>(
    message: &Bound<'py, PyDict>,
    result: LiquidityResult,
) -> PyResult<Bound<'py, PyDict>> {
    let output = message.copy()?;
    output.set_item(fields::LIQUIDITY_SCORE, result.liquidity_score)?;
    output.set_item(fields::LIQUIDITY_SIGNAL, result.liquidity_signal.as_str())?;
    Ok(output)
}

/// Run the schema check for a single message.
///
/// The callable sees the caller's dict; errors it raises propagate.
fn check_schema(
    message: &Bound<'_, PyDict>,
    view: &Message,
    schema: Option<&Bound<'_, PyAny>>,
) -> PyResult<bool> {
    match schema {
        Some(callable) => callable.call1((message,))?.is_truthy(),
        None => Ok(MarketDataSchema::new().validate_message_schema(view)),
    }
}

fn validate_view(view: Message, verdict: bool) -> liquidity_core::Result<ValidatedMessage> {
    liquidity_validation::validate_input_message(view, &move |_: &Message| verdict, &TracingSink)
}

fn validate_dict(
    message: &Bound<'_, PyDict>,
    schema: Option<&Bound<'_, PyAny>>,
) -> PyResult<ValidatedMessage> {
    let view = message_view(message)?;
    let verdict = check_schema(message, &view, schema)?;
    validate_view(view, verdict).map_err(to_py_err)
}

// ============================================================================
// Functions
// ============================================================================

/// Validate a message against the schema.
///
/// Returns the same dict when it passes; raises ValidationError otherwise.
#[pyfunction]
#[pyo3(name = "validate_input_message", signature = (message, schema=None))]
fn py_validate_input_message<'py>(
    message: &Bound<'py, PyDict>,
    schema: Option<&Bound<'py, PyAny>>,
) -> PyResult<Bound<'py, PyDict>> {
    validate_dict(message, schema)?;
    Ok(message.clone())
}

/// Compute the liquidity score and signal for an already validated message.
#[pyfunction]
#[pyo3(name = "compute_liquidity_signal")]
fn py_compute_liquidity_signal<'py>(message: &Bound<'py, PyDict>) -> PyResult<Bound<'py, PyDict>> {
    let validated = ValidatedMessage::assume_valid(message_view(message)?);
    let enriched = liquidity_scoring::compute_liquidity_signal(
        &validated,
        &ScoringConfig::default(),
        &TracingSink,
    )
    .map_err(to_py_err)?;
    enriched_dict(message, enriched.result())
}

/// Validate then score one message.
#[pyfunction]
#[pyo3(signature = (message, schema=None))]
fn process_message<'py>(
    message: &Bound<'py, PyDict>,
    schema: Option<&Bound<'py, PyAny>>,
) -> PyResult<Bound<'py, PyDict>> {
    let validated = validate_dict(message, schema)?;
    let enriched = RustLiquidityScorer::new()
        .score(&validated)
        .map_err(to_py_err)?;
    enriched_dict(message, enriched.result())
}

/// Process a list of messages.
///
/// Returns a dict with `enriched`, `rejected` (index and error text) and
/// `stats`. A schema callable that raises rejects that message only.
#[pyfunction]
#[pyo3(signature = (messages, schema=None))]
fn process_batch<'py>(
    py: Python<'py>,
    messages: Vec<Bound<'py, PyDict>>,
    schema: Option<Bound<'py, PyAny>>,
) -> PyResult<Bound<'py, PyDict>> {
    let scorer = RustLiquidityScorer::new();
    let default_schema = MarketDataSchema::new();
    let sink = TracingSink;

    let enriched = PyList::empty_bound(py);
    let rejected = PyList::empty_bound(py);
    let mut stats = BatchStats::default();

    for (index, message) in messages.iter().enumerate() {
        let view = message_view(message)?;
        let verdict = match &schema {
            Some(callable) => callable
                .call1((message,))
                .and_then(|answer| answer.is_truthy())
                .unwrap_or(false),
            None => default_schema.validate_message_schema(&view),
        };

        match validate_view(view, verdict).and_then(|validated| scorer.score(&validated)) {
            Ok(output) => {
                stats.record_enriched(output.liquidity_signal());
                enriched.append(enriched_dict(message, output.result())?)?;
            }
            Err(error) => {
                sink.warn(format_args!("Rejected message {}: {}", index, error));
                stats.record_failure(error.kind());
                let entry = PyDict::new_bound(py);
                entry.set_item("index", index)?;
                entry.set_item("error", error.to_string())?;
                rejected.append(entry)?;
            }
        }
    }

    sink.info(format_args!(
        "Processed batch: {}/{} enriched, {} liquid",
        stats.enriched, stats.total, stats.liquid
    ));

    let stats = serde_json::to_value(&stats).map_err(|e| PyValueError::new_err(e.to_string()))?;
    let result = PyDict::new_bound(py);
    result.set_item("enriched", enriched)?;
    result.set_item("rejected", rejected)?;
    result.set_item("stats", value_to_py(py, &stats)?)?;
    Ok(result)
}

/// Install the tracing subscriber. Call once per process.
#[pyfunction]
#[pyo3(signature = (level="info", json=false))]
fn init_logging(level: &str, json: bool) -> PyResult<()> {
    let config = LoggingConfig {
        level: level.to_string(),
        json,
        ..LoggingConfig::default()
    };
    init_tracing(&config).map_err(to_py_err)
}

// ============================================================================
// Classes
// ============================================================================

/// Liquidity scorer with a custom policy.
#[pyclass]
pub struct PyLiquidityScorer {
    inner: RustLiquidityScorer,
}

#[pymethods]
impl PyLiquidityScorer {
    #[new]
    fn new() -> Self {
        PyLiquidityScorer {
            inner: RustLiquidityScorer::new(),
        }
    }

    /// Create from a custom policy.
    #[staticmethod]
    #[pyo3(signature = (
        default_avg_volume=liquidity_core::config::DEFAULT_AVG_VOLUME,
        default_turnover_ratio=liquidity_core::config::DEFAULT_TURNOVER_RATIO,
        liquid_threshold=liquidity_core::config::LIQUID_THRESHOLD,
        score_decimals=liquidity_core::config::SCORE_DECIMALS,
        volume_normalizer=liquidity_core::config::VOLUME_NORMALIZER,
        default_symbol=None,
    ))]
    fn with_config(
        default_avg_volume: i64,
        default_turnover_ratio: f64,
        liquid_threshold: f64,
        score_decimals: u32,
        volume_normalizer: f64,
        default_symbol: Option<String>,
    ) -> PyResult<Self> {
        let mut config = ScoringConfig {
            default_avg_volume,
            default_turnover_ratio,
            liquid_threshold,
            score_decimals,
            volume_normalizer,
            ..ScoringConfig::default()
        };
        if let Some(symbol) = default_symbol {
            config.default_symbol = symbol;
        }
        config.validate().map_err(to_py_err)?;
        Ok(PyLiquidityScorer {
            inner: RustLiquidityScorer::with_config(config),
        })
    }

    /// Score a validated message.
    fn score<'py>(&self, message: &Bound<'py, PyDict>) -> PyResult<Bound<'py, PyDict>> {
        let validated = ValidatedMessage::assume_valid(message_view(message)?);
        let enriched = self.inner.score(&validated).map_err(to_py_err)?;
        enriched_dict(message, enriched.result())
    }

    #[getter]
    fn liquid_threshold(&self) -> f64 {
        self.inner.config().liquid_threshold
    }

    #[getter]
    fn score_decimals(&self) -> u32 {
        self.inner.config().score_decimals
    }

    fn __repr__(&self) -> String {
        let config = self.inner.config();
        format!(
            "LiquidityScorer(threshold={}, decimals={}, default_avg_volume={}, \
             default_turnover_ratio={})",
            config.liquid_threshold,
            config.score_decimals,
            config.default_avg_volume,
            config.default_turnover_ratio
        )
    }
}

// ============================================================================
// Module Definition
// ============================================================================

/// Liquidity Signal Core - Rust validation and scoring for Python.
#[pymodule]
fn liquidity_signal_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Exceptions
    m.add("ValidationError", m.py().get_type_bound::<ValidationError>())?;
    m.add("CoercionError", m.py().get_type_bound::<CoercionError>())?;

    // Functions
    m.add_function(wrap_pyfunction!(py_validate_input_message, m)?)?;
    m.add_function(wrap_pyfunction!(py_compute_liquidity_signal, m)?)?;
    m.add_function(wrap_pyfunction!(process_message, m)?)?;
    m.add_function(wrap_pyfunction!(process_batch, m)?)?;
    m.add_function(wrap_pyfunction!(init_logging, m)?)?;

    // Classes
    m.add_class::<PyLiquidityScorer>()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use liquidity_core::config::{
        DEFAULT_AVG_VOLUME, DEFAULT_TURNOVER_RATIO, SCORE_DECIMALS, VOLUME_NORMALIZER,
    };
    use pyo3::exceptions::PyZeroDivisionError;
    use serde_json::json;

    fn eval<'py>(py: Python<'py>, code: &str) -> Bound<'py, PyAny> {
        py.eval_bound(code, None, None).unwrap()
    }

    fn eval_dict<'py>(py: Python<'py>, code: &str) -> Bound<'py, PyDict> {
        eval(py, code).downcast_into::<PyDict>().unwrap()
    }

    fn item<'py>(dict: &Bound<'py, PyDict>, key: &str) -> Bound<'py, PyAny> {
        dict.get_item(key).unwrap().unwrap()
    }

    #[test]
    fn test_bool_converts_before_int() {
        Python::with_gil(|py| {
            assert_eq!(py_to_value(&eval(py, "True")).unwrap(), json!(true));
            assert_eq!(py_to_value(&eval(py, "1")).unwrap(), json!(1));
        });
    }

    #[test]
    fn test_view_conversions() {
        Python::with_gil(|py| {
            assert_eq!(py_to_value(&eval(py, "float('nan')")).unwrap(), json!("nan"));
            assert_eq!(py_to_value(&eval(py, "float('-inf')")).unwrap(), json!("-inf"));
            assert_eq!(py_to_value(&eval(py, "(1, 'a')")).unwrap(), json!([1, "a"]));
            assert_eq!(
                py_to_value(&eval(py, "2 ** 70")).unwrap(),
                json!("1180591620717411303424")
            );
            assert_eq!(
                py_to_value(&eval(py, "__import__('decimal').Decimal('1.5')")).unwrap(),
                json!("1.5")
            );
        });
    }

    #[test]
    fn test_scored_fields_use_host_numeric_conversion() {
        Python::with_gil(|py| {
            let message = eval_dict(
                py,
                "{'avg_volume': __import__('decimal').Decimal('1500000.7'), \
                  'turnover_ratio': __import__('decimal').Decimal('0.5'), \
                  'price': __import__('decimal').Decimal('1.5'), 1: 'x'}",
            );
            let view = message_view(&message).unwrap();
            assert_eq!(view["avg_volume"], json!(1_500_000));
            assert_eq!(view["turnover_ratio"], json!(0.5));
            assert_eq!(view["price"], json!("1.5"));
            assert_eq!(view["1"], json!("x"));
        });
    }

    #[test]
    fn test_validate_returns_same_dict() {
        Python::with_gil(|py| {
            let message = eval_dict(py, "{'symbol': 'AAPL', 'avg_volume': 5}");
            let out = py_validate_input_message(&message, None).unwrap();
            assert!(out.is(&message));
        });
    }

    #[test]
    fn test_validation_errors() {
        Python::with_gil(|py| {
            let message = eval_dict(py, "{'symbol': 'AAPL'}");

            let reject = eval(py, "lambda m: False");
            let err = py_validate_input_message(&message, Some(&reject)).unwrap_err();
            assert!(err.is_instance_of::<ValidationError>(py));
            assert!(err.is_instance_of::<PyValueError>(py));

            let raising = eval(py, "lambda m: 1 / 0");
            let err = py_validate_input_message(&message, Some(&raising)).unwrap_err();
            assert!(err.is_instance_of::<PyZeroDivisionError>(py));
        });
    }

    #[test]
    fn test_exceptions_subclass_value_error() {
        Python::with_gil(|py| {
            let validation = py.get_type_bound::<ValidationError>();
            let coercion = py.get_type_bound::<CoercionError>();
            assert!(validation.is_subclass_of::<PyValueError>().unwrap());
            assert!(coercion.is_subclass_of::<PyValueError>().unwrap());
        });
    }

    #[test]
    fn test_unread_fields_pass_through_untouched() {
        Python::with_gil(|py| {
            let message = eval_dict(
                py,
                "{'symbol': 'A', 'price': float('nan'), 'tags': ('x', 'y'), \
                  'ts': __import__('datetime').datetime(2024, 1, 2)}",
            );
            let out = py_compute_liquidity_signal(&message).unwrap();

            assert!(!out.is(&message));
            assert!(item(&out, "price").extract::<f64>().unwrap().is_nan());
            assert!(item(&out, "tags").is_instance_of::<PyTuple>());
            assert!(item(&out, "ts").is(&item(&message, "ts")));
            assert_eq!(item(&out, "liquidity_score").extract::<f64>().unwrap(), 1.8);
            assert_eq!(
                item(&out, "liquidity_signal").extract::<String>().unwrap(),
                "ILLIQUID"
            );
            assert_eq!(
                out.keys().extract::<Vec<String>>().unwrap(),
                vec!["symbol", "price", "tags", "ts", "liquidity_score", "liquidity_signal"]
            );
            assert_eq!(message.len(), 4);
        });
    }

    #[test]
    fn test_non_finite_score_stays_float() {
        Python::with_gil(|py| {
            let message = eval_dict(py, "{'turnover_ratio': float('inf')}");
            let out = process_message(&message, None).unwrap();
            assert!(item(&out, "liquidity_score").extract::<f64>().unwrap().is_infinite());
            assert!(item(&out, "turnover_ratio").is_instance_of::<PyFloat>());
            assert_eq!(
                item(&out, "liquidity_signal").extract::<String>().unwrap(),
                "LIQUID"
            );

            let message = eval_dict(py, "{'turnover_ratio': float('nan')}");
            let out = process_message(&message, None).unwrap();
            assert!(item(&out, "liquidity_score").extract::<f64>().unwrap().is_nan());
            assert_eq!(
                item(&out, "liquidity_signal").extract::<String>().unwrap(),
                "ILLIQUID"
            );
        });
    }

    #[test]
    fn test_decimal_ratio_is_scored() {
        Python::with_gil(|py| {
            let message = eval_dict(
                py,
                "{'avg_volume': 1500000, \
                  'turnover_ratio': __import__('decimal').Decimal('0.33333')}",
            );
            let out = process_message(&message, None).unwrap();
            assert_eq!(item(&out, "liquidity_score").extract::<f64>().unwrap(), 1.8333);
        });
    }

    #[test]
    fn test_coercion_error_raised() {
        Python::with_gil(|py| {
            let message = eval_dict(py, "{'avg_volume': 'not_a_number'}");
            let err = process_message(&message, None).unwrap_err();
            assert!(err.is_instance_of::<CoercionError>(py));
        });
    }

    #[test]
    fn test_batch_raising_schema_rejects_one_message() {
        Python::with_gil(|py| {
            let messages = vec![
                eval_dict(py, "{'symbol': 'A', 'avg_volume': 2000000, 'tags': ('x',)}"),
                eval_dict(py, "{'symbol': 'B'}"),
            ];
            let schema = eval(py, "lambda m: m['symbol'] == 'A' or 1 / 0");
            let result = process_batch(py, messages, Some(schema)).unwrap();

            let enriched = item(&result, "enriched").downcast_into::<PyList>().unwrap();
            assert_eq!(enriched.len(), 1);
            let first = enriched.get_item(0).unwrap().downcast_into::<PyDict>().unwrap();
            assert!(item(&first, "tags").is_instance_of::<PyTuple>());
            assert_eq!(
                item(&first, "liquidity_signal").extract::<String>().unwrap(),
                "LIQUID"
            );

            let rejected = item(&result, "rejected").downcast_into::<PyList>().unwrap();
            assert_eq!(rejected.len(), 1);
            let entry = rejected.get_item(0).unwrap().downcast_into::<PyDict>().unwrap();
            assert_eq!(item(&entry, "index").extract::<usize>().unwrap(), 1);

            let stats = item(&result, "stats").downcast_into::<PyDict>().unwrap();
            assert_eq!(item(&stats, "total").extract::<u64>().unwrap(), 2);
            assert_eq!(item(&stats, "liquid").extract::<u64>().unwrap(), 1);
            assert_eq!(item(&stats, "validation_failures").extract::<u64>().unwrap(), 1);
        });
    }

    #[test]
    fn test_custom_scorer() {
        Python::with_gil(|py| {
            let scorer = PyLiquidityScorer::with_config(
                DEFAULT_AVG_VOLUME,
                DEFAULT_TURNOVER_RATIO,
                1.5,
                SCORE_DECIMALS,
                VOLUME_NORMALIZER,
                None,
            )
            .unwrap();
            assert_eq!(scorer.liquid_threshold(), 1.5);

            let out = scorer.score(&eval_dict(py, "{'symbol': 'X'}")).unwrap();
            assert_eq!(
                item(&out, "liquidity_signal").extract::<String>().unwrap(),
                "LIQUID"
            );

            let invalid = PyLiquidityScorer::with_config(
                DEFAULT_AVG_VOLUME,
                DEFAULT_TURNOVER_RATIO,
                2.0,
                SCORE_DECIMALS,
                0.0,
                None,
            );
            assert!(invalid.is_err());
        });
    }
}
