//! Named functions available to tag grammars and templates.
//!
//! Names are matched case-insensitively with underscores ignored, so
//! `{firstname}`, `{first_name}` and `{{ FirstName }}` all resolve to the same
//! function.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;

use super::words;
use crate::error::{Error, Result};

/// 1900-01-01T00:00:00Z
const MIN_TIMESTAMP: i64 = -2_208_988_800;
/// 2100-01-01T00:00:00Z
const MAX_TIMESTAMP: i64 = 4_102_444_800;

/// Call the built-in function `name`.
///
/// Returns `None` when no built-in has that name.
pub(crate) fn call<R: Rng>(rng: &mut R, name: &str, args: &[String]) -> Option<Result<String>> {
    let value = match normalize(name).as_str() {
        "firstname" => pick(rng, words::FIRST_NAMES).to_string(),
        "lastname" => pick(rng, words::LAST_NAMES).to_string(),
        "name" => format!(
            "{} {}",
            pick(rng, words::FIRST_NAMES),
            pick(rng, words::LAST_NAMES)
        ),
        "username" => format!(
            "{}{}{}",
            pick(rng, words::FIRST_NAMES).to_lowercase(),
            pick(rng, words::LAST_NAMES).to_lowercase(),
            rng.random_range(0..1000)
        ),
        "email" => format!(
            "{}{}@{}.{}",
            pick(rng, words::FIRST_NAMES).to_lowercase(),
            pick(rng, words::LAST_NAMES).to_lowercase(),
            pick(rng, words::LAST_NAMES).to_lowercase(),
            pick(rng, words::TLDS)
        ),
        "word" => pick(rng, words::WORDS).to_string(),
        "sentence" => match arg_i64(name, args, 0, 5) {
            Ok(n) => sentence(rng, n.clamp(1, 100) as usize),
            Err(e) => return Some(Err(e)),
        },
        "hobby" => pick(rng, words::HOBBIES).to_string(),
        "petname" => pick(rng, words::PET_NAMES).to_string(),
        "animal" => pick(rng, words::ANIMALS).to_string(),
        "color" => pick(rng, words::COLORS).to_string(),
        "city" => pick(rng, words::CITIES).to_string(),
        "country" => pick(rng, words::COUNTRIES).to_string(),
        "street" => format!(
            "{} {} {}",
            rng.random_range(1..10_000),
            capitalize(pick(rng, words::WORDS)),
            pick(rng, words::STREET_SUFFIXES)
        ),
        "latitude" => format!("{:.6}", rng.random_range(-90.0..=90.0_f64)),
        "longitude" => format!("{:.6}", rng.random_range(-180.0..=180.0_f64)),
        "domain" => format!("{}.{}", pick(rng, words::WORDS), pick(rng, words::TLDS)),
        "url" => format!(
            "https://www.{}.{}/{}",
            pick(rng, words::WORDS),
            pick(rng, words::TLDS),
            pick(rng, words::WORDS)
        ),
        "ipv4" => format!(
            "{}.{}.{}.{}",
            rng.random_range(1..=254),
            rng.random_range(0..=255),
            rng.random_range(0..=255),
            rng.random_range(1..=254)
        ),
        "uuid" => {
            let mut bytes = [0u8; 16];
            rng.fill(&mut bytes);
            uuid::Builder::from_random_bytes(bytes)
                .into_uuid()
                .to_string()
        }
        "phone" => (0..10)
            .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
            .collect(),
        "number" => {
            let min = match arg_i64(name, args, 0, 0) {
                Ok(v) => v,
                Err(e) => return Some(Err(e)),
            };
            let max = match arg_i64(name, args, 1, 100) {
                Ok(v) => v,
                Err(e) => return Some(Err(e)),
            };
            if min > max {
                return Some(Err(bad_args(name, args, "min exceeds max")));
            }
            rng.random_range(min..=max).to_string()
        }
        "digit" => char::from(b'0' + rng.random_range(0..10u8)).to_string(),
        "letter" => random_letter(rng).to_string(),
        "bool" => rng.random_bool(0.5).to_string(),
        "int32" => rng.random::<i32>().to_string(),
        "uint32" => rng.random::<u32>().to_string(),
        "int64" => rng.random::<i64>().to_string(),
        "uint64" => rng.random::<u64>().to_string(),
        "float32" => finite_f32(rng).to_string(),
        "float64" => finite_f64(rng).to_string(),
        "date" => {
            let ts = random_timestamp(rng);
            match args.first() {
                Some(fmt) if StrftimeItems::new(fmt).any(|i| matches!(i, Item::Error)) => {
                    return Some(Err(bad_args(name, args, "invalid date format")));
                }
                Some(fmt) => ts.format(fmt).to_string(),
                None => ts.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            }
        }
        "year" => rng.random_range(1900..=2099).to_string(),
        "month" => rng.random_range(1..=12).to_string(),
        "day" => rng.random_range(1..=28).to_string(),
        _ => return None,
    };
    Some(Ok(value))
}

/// A uniformly random instant between 1900 and 2100, with nanoseconds.
pub(crate) fn random_timestamp<R: Rng>(rng: &mut R) -> DateTime<Utc> {
    let secs = rng.random_range(MIN_TIMESTAMP..MAX_TIMESTAMP);
    let nanos = rng.random_range(0..1_000_000_000u32);
    DateTime::from_timestamp(secs, nanos).unwrap_or_default()
}

pub(crate) fn random_letter<R: Rng>(rng: &mut R) -> char {
    const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
    char::from(LETTERS[rng.random_range(0..LETTERS.len())])
}

/// Random bit patterns, redrawn until finite.
pub(crate) fn finite_f32<R: Rng>(rng: &mut R) -> f32 {
    loop {
        let f = f32::from_bits(rng.random::<u32>());
        if f.is_finite() {
            return f;
        }
    }
}

pub(crate) fn finite_f64<R: Rng>(rng: &mut R) -> f64 {
    loop {
        let f = f64::from_bits(rng.random::<u64>());
        if f.is_finite() {
            return f;
        }
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

fn pick<'a, R: Rng>(rng: &mut R, list: &[&'a str]) -> &'a str {
    list[rng.random_range(0..list.len())]
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(c) => c.to_uppercase().to_string() + chars.as_str(),
    }
}

fn sentence<R: Rng>(rng: &mut R, count: usize) -> String {
    let body = (0..count)
        .map(|_| pick(rng, words::WORDS))
        .collect::<Vec<_>>()
        .join(" ");
    format!("{}.", capitalize(&body))
}

fn arg_i64(name: &str, args: &[String], index: usize, default: i64) -> Result<i64> {
    match args.get(index) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| bad_args(name, args, &format!("argument {raw:?} is not an integer"))),
    }
}

fn bad_args(name: &str, args: &[String], reason: &str) -> Error {
    Error::Grammar {
        input: format!("{name}:{}", args.join(",")),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn call_ok(name: &str, args: &[&str]) -> String {
        let mut rng = StdRng::seed_from_u64(7);
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        call(&mut rng, name, &args).unwrap().unwrap()
    }

    #[test]
    fn names_are_normalized() {
        assert!(words::FIRST_NAMES.contains(&call_ok("FirstName", &[]).as_str()));
        assert!(words::FIRST_NAMES.contains(&call_ok("first_name", &[]).as_str()));
    }

    #[test]
    fn unknown_name_is_none() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(call(&mut rng, "nope", &[]).is_none());
    }

    #[test]
    fn number_respects_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        let args = vec!["5".to_string(), "7".to_string()];
        for _ in 0..50 {
            let n: i64 = call(&mut rng, "number", &args).unwrap().unwrap().parse().unwrap();
            assert!((5..=7).contains(&n));
        }
    }

    #[test]
    fn number_rejects_bad_arguments() {
        let mut rng = StdRng::seed_from_u64(1);
        let args = vec!["x".to_string()];
        assert!(call(&mut rng, "number", &args).unwrap().is_err());
        let args = vec!["9".to_string(), "1".to_string()];
        assert!(call(&mut rng, "number", &args).unwrap().is_err());
    }

    #[test]
    fn uuid_is_v4_shaped() {
        let id = call_ok("uuid", &[]);
        assert_eq!(id.len(), 36);
        assert_eq!(id.as_bytes()[14], b'4');
    }

    #[test]
    fn email_has_domain() {
        let email = call_ok("email", &[]);
        let (local, domain) = email.split_once('@').unwrap();
        assert!(!local.is_empty());
        assert!(domain.contains('.'));
    }

    #[test]
    fn date_with_format() {
        let year = call_ok("date", &["%Y"]);
        let year: i32 = year.parse().unwrap();
        assert!((1900..2100).contains(&year));
    }

    #[test]
    fn date_rejects_bad_format() {
        let mut rng = StdRng::seed_from_u64(7);
        let args = vec!["%Q".to_string()];
        assert!(call(&mut rng, "date", &args).unwrap().is_err());
    }

    #[test]
    fn default_date_is_rfc3339() {
        let date = call_ok("date", &[]);
        assert!(DateTime::parse_from_rfc3339(&date).is_ok(), "{date}");
    }

    #[test]
    fn random_floats_are_finite() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..1000 {
            assert!(finite_f32(&mut rng).is_finite());
            assert!(finite_f64(&mut rng).is_finite());
        }
    }
}
