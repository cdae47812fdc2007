// String-to-number coercion with JavaScript `Number()` semantics, except
// that blank input coerces to NaN rather than 0: an attribute value made
// of whitespace is never a usable timestamp.

pub(crate) fn parse_js_number_from_string(src: &str) -> f64 {
    let trimmed = src.trim();
    if trimmed.is_empty() {
        return f64::NAN;
    }
    if trimmed == "Infinity" || trimmed == "+Infinity" {
        return f64::INFINITY;
    }
    if trimmed == "-Infinity" {
        return f64::NEG_INFINITY;
    }

    if trimmed.starts_with('+') || trimmed.starts_with('-') {
        let rest = &trimmed[1..];
        if rest.starts_with("0x")
            || rest.starts_with("0X")
            || rest.starts_with("0o")
            || rest.starts_with("0O")
            || rest.starts_with("0b")
            || rest.starts_with("0B")
        {
            return f64::NAN;
        }
    }

    if let Some(digits) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        return parse_prefixed_radix_to_f64(digits, 16);
    }
    if let Some(digits) = trimmed
        .strip_prefix("0o")
        .or_else(|| trimmed.strip_prefix("0O"))
    {
        return parse_prefixed_radix_to_f64(digits, 8);
    }
    if let Some(digits) = trimmed
        .strip_prefix("0b")
        .or_else(|| trimmed.strip_prefix("0B"))
    {
        return parse_prefixed_radix_to_f64(digits, 2);
    }

    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

pub(crate) fn parse_prefixed_radix_to_f64(src: &str, radix: u32) -> f64 {
    if src.is_empty() {
        return f64::NAN;
    }
    let mut out = 0.0f64;
    for ch in src.chars() {
        let Some(digit) = ch.to_digit(radix) else {
            return f64::NAN;
        };
        out = out * (radix as f64) + (digit as f64);
    }
    out
}

pub(crate) fn format_number_default(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value == f64::INFINITY {
        return "Infinity".to_string();
    }
    if value == f64::NEG_INFINITY {
        return "-Infinity".to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    if value.fract() == 0.0 && value >= i64::MIN as f64 && value <= i64::MAX as f64 {
        let integer = value as i64;
        if (integer as f64) == value {
            return integer.to_string();
        }
    }

    format!("{value}")
}
