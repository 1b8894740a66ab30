//! C-compatible API for a host display layer.
//!
//! The host opens a context once, issues any number of requests against it
//! and closes it on shutdown. Every returned string is JSON and must be
//! released with [`bookrec_free_str`].

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::Path;
use std::ptr;

use serde_json::{json, Value};

use crate::common::config::AppCfg;
use crate::common::error::{BookrecError, ErrorCode};
use crate::common::log as logging;
use crate::data::domain::UserId;
use crate::recommend::context::AppContext;
use crate::recommend::domain::{Recommendation, REDUCE_REQUEST_NOTICE};

/// ABI version to coordinate with the host.
#[no_mangle]
pub extern "C" fn bookrec_api_version() -> u32 {
    1
}

/// Load configuration, data and models. Returns null on failure.
///
/// A null `config_path` reads the configuration from the environment.
///
/// # Safety
/// `config_path` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn bookrec_open(config_path: *const c_char) -> *mut AppContext {
    let cfg = if config_path.is_null() {
        AppCfg::load()
    } else {
        let path = CStr::from_ptr(config_path).to_string_lossy().into_owned();
        AppCfg::load_from(Some(Path::new(&path)))
    };
    let cfg = match cfg {
        Ok(cfg) => cfg,
        Err(err) => {
            logging::init(AppCfg::default().log_level);
            log::error!("bookrec_open: {err}");
            return ptr::null_mut();
        }
    };
    logging::init(cfg.log_level);

    match AppContext::load(cfg) {
        Ok(ctx) => Box::into_raw(Box::new(ctx)),
        Err(err) => {
            log::error!("bookrec_open: {err}");
            ptr::null_mut()
        }
    }
}

/// Release a context returned by [`bookrec_open`].
///
/// # Safety
/// `ctx` must be null or a pointer obtained from `bookrec_open` that has not
/// been closed yet.
#[no_mangle]
pub unsafe extern "C" fn bookrec_close(ctx: *mut AppContext) {
    if !ctx.is_null() {
        drop(Box::from_raw(ctx));
    }
}

/// Highest average-rated books as JSON.
///
/// # Safety
/// `ctx` must be null or a live pointer from `bookrec_open`.
#[no_mangle]
pub unsafe extern "C" fn bookrec_top_rated(ctx: *const AppContext) -> *mut c_char {
    match ctx.as_ref() {
        Some(ctx) => string_to_raw(top_rated_json(ctx)),
        None => string_to_raw(error_json(&BookrecError::invalid("null context"))),
    }
}

/// Personalised recommendations as JSON.
///
/// # Safety
/// `ctx` must be null or a live pointer from `bookrec_open`; `method` must be
/// null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn bookrec_recommend(
    ctx: *const AppContext,
    user_id: u64,
    method: *const c_char,
    n: i32,
) -> *mut c_char {
    let Some(ctx) = ctx.as_ref() else {
        return string_to_raw(error_json(&BookrecError::invalid("null context")));
    };
    if method.is_null() {
        return string_to_raw(error_json(&BookrecError::invalid("null method")));
    }
    let method = CStr::from_ptr(method).to_string_lossy();
    string_to_raw(recommend_json(ctx, UserId(user_id), &method, i64::from(n)))
}

/// Free strings allocated by this library.
///
/// # Safety
/// `ptr` must be null or a string returned by this library, freed once.
#[no_mangle]
pub unsafe extern "C" fn bookrec_free_str(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

/// JSON body of [`bookrec_top_rated`].
pub fn top_rated_json(ctx: &AppContext) -> String {
    json!({ "ok": true, "code": ErrorCode::Ok as u32, "books": ctx.top_rated() }).to_string()
}

/// JSON body of [`bookrec_recommend`]. Negative `n` is rejected.
pub fn recommend_json(ctx: &AppContext, user: UserId, method: &str, n: i64) -> String {
    let n = match usize::try_from(n) {
        Ok(n) => n,
        Err(_) => {
            return error_json(&BookrecError::invalid(format!(
                "recommendation count must not be negative, got {n}"
            )))
        }
    };
    match ctx.recommend(method, user, n) {
        Ok(Recommendation::Ranked(books)) => {
            json!({ "ok": true, "code": ErrorCode::Ok as u32, "books": books }).to_string()
        }
        Ok(Recommendation::InsufficientCandidates {
            requested,
            available,
        }) => json!({
            "ok": false,
            "code": ErrorCode::InsufficientCandidates as u32,
            "message": REDUCE_REQUEST_NOTICE,
            "requested": requested,
            "available": available,
        })
        .to_string(),
        Err(err) => error_json(&err),
    }
}

fn error_json(err: &BookrecError) -> String {
    let body: Value = json!({
        "ok": false,
        "code": err.code() as u32,
        "message": err.to_string(),
    });
    body.to_string()
}

fn string_to_raw(s: String) -> *mut c_char {
    match CString::new(s) {
        Ok(cstring) => cstring.into_raw(),
        Err(_) => fallback_json_raw(),
    }
}

fn fallback_json_raw() -> *mut c_char {
    let code = ErrorCode::Internal as u32;
    CString::new(format!("{{\"ok\":false,\"code\":{code}}}"))
        .map(CString::into_raw)
        .unwrap_or(ptr::null_mut())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::domain::{Book, Catalog, Dataset, Isbn, Rating, RatingTable};
    use crate::model::baseline::{NormalParams, NormalPredictor};
    use crate::model::domain::RatingScale;
    use crate::model::registry::ModelRegistry;

    fn ctx() -> AppContext {
        let books = (0..3)
            .map(|i| Book {
                isbn: Isbn::new(format!("isbn-{i}")),
                title: format!("Book {i}"),
                author: "A".into(),
                year: "2000".into(),
                average_rating: 5.0 + i as f64,
                rating_count: 1,
                image: String::new(),
            })
            .collect();
        let dataset = Dataset {
            ratings: RatingTable::new(vec![Rating::new(7, Isbn::new("isbn-0"), 8.0)]),
            catalog: Catalog::new(books).unwrap(),
        };
        let mut registry = ModelRegistry::new();
        let params = NormalParams {
            mean: 6.0,
            std: 1.0,
            seed: 3,
        };
        registry.register(Box::new(
            NormalPredictor::new(params, RatingScale::default()).unwrap(),
        ));
        AppContext::from_parts(AppCfg::default(), dataset, registry)
    }

    fn parse(s: &str) -> Value {
        serde_json::from_str(s).unwrap()
    }

    #[test]
    fn recommend_returns_books() {
        let out = parse(&recommend_json(&ctx(), UserId(7), "NormalPredictor", 2));
        assert_eq!(out["ok"], true);
        assert_eq!(out["code"], ErrorCode::Ok as u32);
        assert_eq!(out["books"].as_array().unwrap().len(), 2);
        assert!(out["books"][0]["predicted_rating"].is_number());
    }

    #[test]
    fn oversized_request_carries_the_notice() {
        let out = parse(&recommend_json(&ctx(), UserId(7), "NormalPredictor", 3));
        assert_eq!(out["ok"], false);
        assert_eq!(out["code"], 1);
        assert_eq!(out["message"], REDUCE_REQUEST_NOTICE);
        assert_eq!(out["available"], 2);
    }

    #[test]
    fn negative_count_is_invalid_input() {
        let out = parse(&recommend_json(&ctx(), UserId(7), "NormalPredictor", -1));
        assert_eq!(out["code"], ErrorCode::InvalidInput as u32);
    }

    #[test]
    fn unloaded_model_is_reported() {
        let out = parse(&recommend_json(&ctx(), UserId(7), "SVD", 1));
        assert_eq!(out["code"], ErrorCode::ModelMissing as u32);
    }

    #[test]
    fn top_rated_lists_best_first() {
        let out = parse(&top_rated_json(&ctx()));
        assert_eq!(out["code"], 0);
        assert_eq!(out["books"][0]["isbn"], "isbn-2");
        assert_eq!(out["books"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn unencodable_response_falls_back_to_internal_code() {
        let raw = string_to_raw("bad\0string".to_owned());
        let text = unsafe { CStr::from_ptr(raw) }.to_str().unwrap().to_owned();
        unsafe { bookrec_free_str(raw) };
        assert_eq!(parse(&text)["code"], ErrorCode::Internal as u32);
    }

    #[test]
    fn raw_round_trip_through_the_c_abi() {
        let ctx = Box::into_raw(Box::new(ctx()));
        let method = CString::new("npred").unwrap();
        unsafe {
            let raw = bookrec_recommend(ctx, 7, method.as_ptr(), 1);
            let text = CStr::from_ptr(raw).to_str().unwrap().to_owned();
            bookrec_free_str(raw);
            assert_eq!(parse(&text)["ok"], true);

            let raw = bookrec_recommend(ptr::null(), 7, method.as_ptr(), 1);
            let text = CStr::from_ptr(raw).to_str().unwrap().to_owned();
            bookrec_free_str(raw);
            assert_eq!(parse(&text)["ok"], false);

            bookrec_close(ctx);
        }
        assert_eq!(bookrec_api_version(), 1);
    }
}
