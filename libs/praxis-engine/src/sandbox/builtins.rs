/// Courseware Builtins - Native Functions Inside the Sandbox
///
/// **Core Responsibility:** Implements the small, beginner-oriented function
/// surface that lesson scripts are written against: `print`, `input`, and a
/// set of list/number helpers. Each builtin is a native function registered
/// on the sandbox's global object; none of them can touch the filesystem,
/// the network or the process.
///
/// Rendering conventions: `print` shows strings verbatim at the top level,
/// whole numbers without a decimal point, and lists Python-style with nested
/// strings in single quotes. `input` echoes the consumed value plus a
/// newline into the output, mirroring what a learner would see in a real
/// terminal session.
use std::cmp::Ordering;

use boa_engine::object::builtins::JsArray;
use boa_engine::object::FunctionObjectBuilder;
use boa_engine::property::Attribute;
use boa_engine::{js_string, Context, JsNativeError, JsResult, JsValue, NativeFunction};

use super::io;

type NativeFn = fn(&JsValue, &[JsValue], &mut Context) -> JsResult<JsValue>;

/// Materialized `range()` results are bounded so a single call cannot
/// exhaust memory before the deadline fires.
const MAX_RANGE_LEN: usize = 1_000_000;

/// Name, implementation and canonical arity of every courseware builtin.
const BUILTINS: &[(&str, NativeFn, usize)] = &[
    ("print", builtin_print, 1),
    ("input", builtin_input, 1),
    ("len", builtin_len, 1),
    ("range", builtin_range, 1),
    ("abs", builtin_abs, 1),
    ("min", builtin_min, 1),
    ("max", builtin_max, 1),
    ("sum", builtin_sum, 1),
    ("round", builtin_round, 1),
    ("int", builtin_int, 1),
    ("float", builtin_float, 1),
    ("str", builtin_str, 1),
    ("bool", builtin_bool, 1),
    ("enumerate", builtin_enumerate, 1),
    ("zip", builtin_zip, 2),
    ("sorted", builtin_sorted, 1),
    ("reversed", builtin_reversed, 1),
    ("any", builtin_any, 1),
    ("all", builtin_all, 1),
    ("filter", builtin_filter, 2),
    ("map", builtin_map, 2),
    ("type", builtin_type, 1),
    ("isinstance", builtin_isinstance, 2),
];

pub(crate) fn names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|(name, _, _)| *name)
}

/// Registers every courseware builtin on the context's global object.
pub(crate) fn register_all(context: &mut Context) -> JsResult<()> {
    for (name, implementation, arity) in BUILTINS {
        let function = FunctionObjectBuilder::new(
            context.realm(),
            NativeFunction::from_fn_ptr(*implementation),
        )
        .name(js_string!(*name))
        .length(*arity)
        .constructor(false)
        .build();
        context.register_global_property(js_string!(*name), function, Attribute::all())?;
    }
    Ok(())
}

/// Renders a value the way `print` and `str` show it. Top-level strings are
/// verbatim; strings nested inside lists are single-quoted.
pub(crate) fn render_value(value: &JsValue, context: &mut Context, depth: usize) -> JsResult<String> {
    if let Some(s) = value.as_string() {
        let text = s.to_std_string_escaped();
        return Ok(if depth == 0 { text } else { format!("'{text}'") });
    }
    if value.is_undefined() {
        return Ok("undefined".to_string());
    }
    if value.is_null() {
        return Ok("null".to_string());
    }
    if let Some(b) = value.as_boolean() {
        return Ok(b.to_string());
    }
    if let Some(n) = value.as_number() {
        return Ok(format_number(n));
    }
    if depth < 4 {
        if let Some(array) = as_array(value) {
            let values = array_values(&array, context)?;
            let mut parts = Vec::with_capacity(values.len());
            for element in &values {
                parts.push(render_value(element, context, depth + 1)?);
            }
            return Ok(format!("[{}]", parts.join(", ")));
        }
    }
    Ok(value.display().to_string())
}

/// Whole numbers print without a decimal point; everything else uses the
/// shortest round-trip representation.
fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        return format!("{}", n as i64);
    }
    format!("{n}")
}

fn require_arg<'a>(args: &'a [JsValue], index: usize, name: &str) -> JsResult<&'a JsValue> {
    args.get(index).ok_or_else(|| {
        JsNativeError::typ()
            .with_message(format!("{name}() missing required argument {}", index + 1))
            .into()
    })
}

fn number_arg(args: &[JsValue], index: usize, name: &str) -> JsResult<f64> {
    require_arg(args, index, name)?.as_number().ok_or_else(|| {
        JsNativeError::typ()
            .with_message(format!("{name}() expects a number"))
            .into()
    })
}

fn as_array(value: &JsValue) -> Option<JsArray> {
    let obj = value.as_object()?;
    JsArray::from_object(obj.clone()).ok()
}

fn is_list(value: &JsValue) -> bool {
    as_array(value).is_some()
}

fn array_values(array: &JsArray, context: &mut Context) -> JsResult<Vec<JsValue>> {
    let length = array.length(context)?;
    let mut values = Vec::with_capacity(length as usize);
    for i in 0..length {
        values.push(array.at(i as i64, context)?);
    }
    Ok(values)
}

fn iterable_values(value: &JsValue, context: &mut Context, name: &str) -> JsResult<Vec<JsValue>> {
    match as_array(value) {
        Some(array) => array_values(&array, context),
        None => Err(JsNativeError::typ()
            .with_message(format!("{name}() expects a list"))
            .into()),
    }
}

fn all_numbers(values: &[JsValue]) -> Option<Vec<f64>> {
    values.iter().map(|v| v.as_number()).collect()
}

fn all_strings(values: &[JsValue]) -> Option<Vec<String>> {
    values
        .iter()
        .map(|v| v.as_string().map(|s| s.to_std_string_escaped()))
        .collect()
}

fn builtin_print(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let mut line = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            line.push(' ');
        }
        line.push_str(&render_value(arg, context, 0)?);
    }
    line.push('\n');
    io::write_output(&line);
    Ok(JsValue::undefined())
}

fn builtin_input(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    if let Some(prompt) = args.first() {
        if !prompt.is_undefined() {
            let text = render_value(prompt, context, 0)?;
            io::write_output(&text);
        }
    }
    match io::next_input() {
        Some(value) => {
            io::write_output(&value);
            io::write_output("\n");
            Ok(JsValue::from(js_string!(value)))
        }
        None => {
            let provided = io::provided_count();
            Err(JsNativeError::error()
                .with_message(format!(
                    "EOFError: no more input values ({provided} provided)"
                ))
                .into())
        }
    }
}

fn builtin_len(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let value = require_arg(args, 0, "len")?;
    if let Some(s) = value.as_string() {
        let count = s.to_std_string_escaped().chars().count();
        return Ok(JsValue::from(count as f64));
    }
    if let Some(array) = as_array(value) {
        return Ok(JsValue::from(array.length(context)? as f64));
    }
    Err(JsNativeError::typ()
        .with_message("object of this type has no len()")
        .into())
}

fn builtin_range(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let (start, stop, step) = match args.len() {
        0 => {
            return Err(JsNativeError::typ()
                .with_message("range() missing required argument 1")
                .into())
        }
        1 => (0.0, number_arg(args, 0, "range")?, 1.0),
        2 => (
            number_arg(args, 0, "range")?,
            number_arg(args, 1, "range")?,
            1.0,
        ),
        _ => (
            number_arg(args, 0, "range")?,
            number_arg(args, 1, "range")?,
            number_arg(args, 2, "range")?,
        ),
    };
    if step == 0.0 {
        return Err(JsNativeError::range()
            .with_message("range() step must not be zero")
            .into());
    }

    let mut values = Vec::new();
    let mut current = start;
    while (step > 0.0 && current < stop) || (step < 0.0 && current > stop) {
        if values.len() >= MAX_RANGE_LEN {
            return Err(JsNativeError::range()
                .with_message("range() result is too large")
                .into());
        }
        values.push(JsValue::from(current));
        current += step;
    }
    Ok(JsArray::from_iter(values, context).into())
}

fn builtin_abs(_this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    Ok(JsValue::from(number_arg(args, 0, "abs")?.abs()))
}

/// Accepts either a single list or several direct arguments.
fn collect_sequence(
    args: &[JsValue],
    context: &mut Context,
    name: &str,
) -> JsResult<Vec<JsValue>> {
    if args.is_empty() {
        return Err(JsNativeError::typ()
            .with_message(format!("{name}() expects a list or several values"))
            .into());
    }
    if args.len() == 1 {
        return iterable_values(&args[0], context, name);
    }
    Ok(args.to_vec())
}

fn pick_extreme(values: Vec<JsValue>, name: &str, want_greater: bool) -> JsResult<JsValue> {
    if values.is_empty() {
        return Err(JsNativeError::range()
            .with_message(format!("{name}() of an empty sequence"))
            .into());
    }
    if let Some(numbers) = all_numbers(&values) {
        let mut best = numbers[0];
        for n in &numbers[1..] {
            if (*n > best) == want_greater && *n != best {
                best = *n;
            }
        }
        return Ok(JsValue::from(best));
    }
    if let Some(strings) = all_strings(&values) {
        let mut best = strings[0].clone();
        for s in &strings[1..] {
            if (s.as_str() > best.as_str()) == want_greater && *s != best {
                best = s.clone();
            }
        }
        return Ok(JsValue::from(js_string!(best)));
    }
    Err(JsNativeError::typ()
        .with_message(format!("{name}() arguments must be all numbers or all strings"))
        .into())
}

fn builtin_min(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let values = collect_sequence(args, context, "min")?;
    pick_extreme(values, "min", false)
}

fn builtin_max(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let values = collect_sequence(args, context, "max")?;
    pick_extreme(values, "max", true)
}

fn builtin_sum(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let values = iterable_values(require_arg(args, 0, "sum")?, context, "sum")?;
    let mut total = match args.get(1) {
        Some(start) if !start.is_undefined() => start.as_number().ok_or_else(|| {
            JsNativeError::typ().with_message("sum() start must be a number")
        })?,
        _ => 0.0,
    };
    for value in &values {
        total += value.as_number().ok_or_else(|| {
            JsNativeError::typ().with_message("sum() expects a list of numbers")
        })?;
    }
    Ok(JsValue::from(total))
}

fn builtin_round(_this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let n = number_arg(args, 0, "round")?;
    let ndigits = match args.get(1) {
        Some(d) if !d.is_undefined() => d.as_number().ok_or_else(|| {
            JsNativeError::typ().with_message("round() digits must be a number")
        })? as i32,
        _ => 0,
    };
    let factor = 10f64.powi(ndigits);
    Ok(JsValue::from((n * factor).round() / factor))
}

fn builtin_int(_this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let value = require_arg(args, 0, "int")?;
    if let Some(n) = value.as_number() {
        return Ok(JsValue::from(n.trunc()));
    }
    if let Some(b) = value.as_boolean() {
        return Ok(JsValue::from(if b { 1.0 } else { 0.0 }));
    }
    if let Some(s) = value.as_string() {
        let text = s.to_std_string_escaped();
        let trimmed = text.trim();
        return match trimmed.parse::<i64>() {
            Ok(parsed) => Ok(JsValue::from(parsed as f64)),
            Err(_) => Err(JsNativeError::typ()
                .with_message(format!("invalid literal for int(): '{trimmed}'"))
                .into()),
        };
    }
    Err(JsNativeError::typ()
        .with_message("int() expects a number or a string")
        .into())
}

fn builtin_float(_this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let value = require_arg(args, 0, "float")?;
    if let Some(n) = value.as_number() {
        return Ok(JsValue::from(n));
    }
    if let Some(s) = value.as_string() {
        let text = s.to_std_string_escaped();
        let trimmed = text.trim();
        return match trimmed.parse::<f64>() {
            Ok(parsed) => Ok(JsValue::from(parsed)),
            Err(_) => Err(JsNativeError::typ()
                .with_message(format!("invalid literal for float(): '{trimmed}'"))
                .into()),
        };
    }
    Err(JsNativeError::typ()
        .with_message("float() expects a number or a string")
        .into())
}

fn builtin_str(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let rendered = match args.first() {
        Some(value) => render_value(value, context, 0)?,
        None => String::new(),
    };
    Ok(JsValue::from(js_string!(rendered)))
}

fn builtin_bool(_this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let truthy = args.first().map(|v| v.to_boolean()).unwrap_or(false);
    Ok(JsValue::from(truthy))
}

fn builtin_enumerate(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let values = iterable_values(require_arg(args, 0, "enumerate")?, context, "enumerate")?;
    let start = args
        .get(1)
        .and_then(|v| v.as_number())
        .unwrap_or(0.0);
    let mut pairs: Vec<JsValue> = Vec::with_capacity(values.len());
    for (i, value) in values.into_iter().enumerate() {
        let pair = JsArray::from_iter([JsValue::from(start + i as f64), value], context);
        pairs.push(pair.into());
    }
    Ok(JsArray::from_iter(pairs, context).into())
}

fn builtin_zip(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let mut columns = Vec::with_capacity(args.len());
    for arg in args {
        columns.push(iterable_values(arg, context, "zip")?);
    }
    let shortest = columns.iter().map(|c| c.len()).min().unwrap_or(0);
    let mut rows: Vec<JsValue> = Vec::with_capacity(shortest);
    for i in 0..shortest {
        let tuple: Vec<JsValue> = columns.iter().map(|c| c[i].clone()).collect();
        rows.push(JsArray::from_iter(tuple, context).into());
    }
    Ok(JsArray::from_iter(rows, context).into())
}

fn builtin_sorted(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let values = iterable_values(require_arg(args, 0, "sorted")?, context, "sorted")?;
    if let Some(mut numbers) = all_numbers(&values) {
        numbers.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        let sorted: Vec<JsValue> = numbers.into_iter().map(JsValue::from).collect();
        return Ok(JsArray::from_iter(sorted, context).into());
    }
    if let Some(mut strings) = all_strings(&values) {
        strings.sort();
        let sorted: Vec<JsValue> = strings
            .into_iter()
            .map(|s| JsValue::from(js_string!(s)))
            .collect();
        return Ok(JsArray::from_iter(sorted, context).into());
    }
    Err(JsNativeError::typ()
        .with_message("sorted() expects all numbers or all strings")
        .into())
}

fn builtin_reversed(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let value = require_arg(args, 0, "reversed")?;
    if let Some(s) = value.as_string() {
        let reversed: String = s.to_std_string_escaped().chars().rev().collect();
        return Ok(JsValue::from(js_string!(reversed)));
    }
    let mut values = iterable_values(value, context, "reversed")?;
    values.reverse();
    Ok(JsArray::from_iter(values, context).into())
}

fn builtin_any(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let values = iterable_values(require_arg(args, 0, "any")?, context, "any")?;
    Ok(JsValue::from(values.iter().any(|v| v.to_boolean())))
}

fn builtin_all(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let values = iterable_values(require_arg(args, 0, "all")?, context, "all")?;
    Ok(JsValue::from(values.iter().all(|v| v.to_boolean())))
}

fn builtin_filter(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let function = require_arg(args, 0, "filter")?;
    let callable = function.as_callable().ok_or_else(|| {
        JsNativeError::typ().with_message("filter() first argument must be callable")
    })?;
    let values = iterable_values(require_arg(args, 1, "filter")?, context, "filter")?;
    let mut kept = Vec::new();
    for value in values {
        let keep = callable.call(&JsValue::undefined(), &[value.clone()], context)?;
        if keep.to_boolean() {
            kept.push(value);
        }
    }
    Ok(JsArray::from_iter(kept, context).into())
}

fn builtin_map(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let function = require_arg(args, 0, "map")?;
    let callable = function.as_callable().ok_or_else(|| {
        JsNativeError::typ().with_message("map() first argument must be callable")
    })?;
    let values = iterable_values(require_arg(args, 1, "map")?, context, "map")?;
    let mut mapped = Vec::with_capacity(values.len());
    for value in values {
        mapped.push(callable.call(&JsValue::undefined(), &[value], context)?);
    }
    Ok(JsArray::from_iter(mapped, context).into())
}

fn type_name(value: &JsValue) -> &'static str {
    if value.is_undefined() {
        "undefined"
    } else if value.is_null() {
        "null"
    } else if value.as_boolean().is_some() {
        "bool"
    } else if let Some(n) = value.as_number() {
        if n.fract() == 0.0 {
            "int"
        } else {
            "float"
        }
    } else if value.as_string().is_some() {
        "str"
    } else if value.as_callable().is_some() {
        "function"
    } else if is_list(value) {
        "list"
    } else {
        "dict"
    }
}

fn builtin_type(_this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let value = require_arg(args, 0, "type")?;
    Ok(JsValue::from(js_string!(type_name(value))))
}

fn checker_name(checker: &JsValue, context: &mut Context) -> JsResult<String> {
    if let Some(s) = checker.as_string() {
        return Ok(s.to_std_string_escaped());
    }
    if let Some(obj) = checker.as_object() {
        let name = obj.get(js_string!("name"), context)?;
        if let Some(s) = name.as_string() {
            return Ok(s.to_std_string_escaped());
        }
    }
    Err(JsNativeError::typ()
        .with_message("isinstance() second argument must be a type")
        .into())
}

/// Numbers are floats in this runtime; `int` narrows to whole values while
/// `float` matches any number.
fn builtin_isinstance(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let value = require_arg(args, 0, "isinstance")?;
    let checker = require_arg(args, 1, "isinstance")?;
    let name = checker_name(checker, context)?;
    let matched = match name.as_str() {
        "str" | "String" => value.as_string().is_some(),
        "int" => value.as_number().map(|n| n.fract() == 0.0).unwrap_or(false),
        "float" | "Number" => value.as_number().is_some(),
        "bool" | "Boolean" => value.as_boolean().is_some(),
        "list" | "Array" => is_list(value),
        "dict" | "Object" => {
            value.as_object().is_some() && value.as_callable().is_none() && !is_list(value)
        }
        "function" => value.as_callable().is_some(),
        other => {
            return Err(JsNativeError::typ()
                .with_message(format!("isinstance() does not recognize type '{other}'"))
                .into())
        }
    };
    Ok(JsValue::from(matched))
}
