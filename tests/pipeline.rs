//! End-to-end: CSV tables and JSON artefacts on disk through to rendered output.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use bookrec::api::{ffi, html};
use bookrec::data::domain::{Isbn, UserId};
use bookrec::model::baseline::NormalParams;
use bookrec::model::knn::{KnnParams, NeighbourKey, RatingEntry, SimilarityEntry};
use bookrec::model::svd::{FactorEntry, SvdParams, SvdPpParams};
use bookrec::model::ModelArtefact;
use bookrec::{AppCfg, AppContext, Recommendation};

const CATALOG_SIZE: usize = 30;

fn isbn(i: usize) -> String {
    format!("978000000{i:04}")
}

/// Books 0..30; averages descend from 9.8 with a tie at the top and a 1/3 tail.
fn write_books(dir: &Path) {
    let mut body = String::from(
        "Unnamed: 0,ISBN,user_id,rating,title,author,year,average_rating,count_ratings,predicted_ratings,image\n",
    );
    for i in 0..CATALOG_SIZE {
        let avg = match i {
            0 | 1 => 9.8,
            2 => 9.5,
            3 => 1.0,
            _ => 8.0 + 1.0 / 3.0 - i as f64 * 0.01,
        };
        writeln!(
            body,
            "{i},{},0,0,Title {i},Author {i},{},{avg},{},0,http://img/{i}.jpg",
            isbn(i),
            1990 + i,
            40 + i
        )
        .unwrap();
    }
    fs::write(dir.join("DataGabungan.csv"), body).unwrap();
}

/// Users 1..=3 rate books 0..5; user 4 has a single rating and is filtered
/// out; user 5 only has zero ratings.
fn write_ratings(dir: &Path) {
    let mut body = String::from("User-ID,ISBN,Book-Rating\n");
    for user in 1..=3 {
        for i in 0..5 {
            writeln!(body, "{user},{},{}", isbn(i), 5 + user + i % 2).unwrap();
        }
    }
    writeln!(body, "4,{},7", isbn(10)).unwrap();
    writeln!(body, "5,{},0", isbn(11)).unwrap();
    fs::write(dir.join("Ratings.csv"), body).unwrap();
}

fn write_artefact(dir: &Path, stem: &str, artefact: &ModelArtefact) {
    let text = serde_json::to_string_pretty(artefact).unwrap();
    fs::write(dir.join(format!("{stem}_model.json")), text).unwrap();
}

fn write_models(dir: &Path) {
    let models = dir.join("models");
    fs::create_dir_all(&models).unwrap();

    write_artefact(
        &models,
        "npred",
        &ModelArtefact::NormalPredictor(NormalParams {
            mean: 7.0,
            std: 1.5,
            seed: 11,
        }),
    );

    let ratings = (1..=3u64)
        .flat_map(|u| {
            (0..CATALOG_SIZE).filter(move |i| i % 3 == u as usize % 3).map(move |i| RatingEntry {
                user: UserId(u),
                item: Isbn::new(isbn(i)),
                rating: (i % 10 + 1) as f64,
            })
        })
        .collect();
    let sims = vec![(1, 2, 0.8), (1, 3, 0.2), (2, 3, 0.5)]
        .into_iter()
        .map(|(a, b, sim)| SimilarityEntry {
            a: NeighbourKey::User(UserId(a)),
            b: NeighbourKey::User(UserId(b)),
            sim,
        })
        .collect();
    write_artefact(
        &models,
        "knn",
        &ModelArtefact::Knn(KnnParams {
            k: 40,
            min_k: 1,
            user_based: true,
            global_mean: 7.0,
            ratings,
            similarities: sims,
        }),
    );

    let users: HashMap<UserId, FactorEntry> = (1..=3u64)
        .map(|u| {
            (
                UserId(u),
                FactorEntry {
                    bias: 0.1 * u as f64,
                    factors: vec![1.0, -0.5],
                },
            )
        })
        .collect();
    let items: HashMap<Isbn, FactorEntry> = (0..CATALOG_SIZE)
        .map(|i| {
            (
                Isbn::new(isbn(i)),
                FactorEntry {
                    bias: (i % 7) as f64 * 0.1,
                    factors: vec![(i % 5) as f64 * 0.2, (i % 3) as f64 * 0.1],
                },
            )
        })
        .collect();
    write_artefact(
        &models,
        "svd",
        &ModelArtefact::Svd(SvdParams {
            global_mean: 7.0,
            biased: true,
            users: users.clone(),
            items: items.clone(),
        }),
    );

    let implicit = (0..CATALOG_SIZE)
        .map(|i| (Isbn::new(isbn(i)), vec![0.01 * i as f64, 0.0]))
        .collect();
    let rated = (1..=3u64)
        .map(|u| (UserId(u), (0..5).map(|i| Isbn::new(isbn(i))).collect()))
        .collect();
    write_artefact(
        &models,
        "svdpp",
        &ModelArtefact::SvdPp(SvdPpParams {
            global_mean: 7.0,
            users,
            items,
            implicit,
            rated,
        }),
    );
}

fn fixture() -> (TempDir, AppContext) {
    let dir = tempfile::tempdir().unwrap();
    write_books(dir.path());
    write_ratings(dir.path());
    write_models(dir.path());

    let mut cfg = AppCfg::default();
    cfg.apply_file(&format!(
        "data_root={}\nmin_raters_per_item=3\nmin_ratings_per_user=5\n",
        dir.path().display()
    ))
    .unwrap();
    let ctx = AppContext::load(cfg).unwrap();
    (dir, ctx)
}

#[test]
fn load_filters_ratings_but_keeps_the_whole_catalog() {
    let (_dir, ctx) = fixture();
    assert_eq!(ctx.dataset().catalog.len(), CATALOG_SIZE);
    assert_eq!(ctx.dataset().ratings.len(), 15);
    assert!(ctx.dataset().ratings.items_rated_by(UserId(4)).is_none());
    assert!(ctx.dataset().ratings.items_rated_by(UserId(5)).is_none());
    assert_eq!(ctx.registry().len(), 4);
}

#[test]
fn top_twenty_is_sorted_and_rounded() {
    let (_dir, ctx) = fixture();
    let top = ctx.top_rated();
    assert_eq!(top.len(), 20);
    let head: Vec<f64> = top.iter().take(3).map(|b| b.average_rating).collect();
    assert_eq!(head, vec![9.8, 9.8, 9.5]);
    assert_eq!(top[0].isbn.as_str(), isbn(0));
    assert!(top.windows(2).all(|w| w[0].average_rating >= w[1].average_rating));
    assert!(top
        .iter()
        .all(|b| (b.average_rating * 100.0 - (b.average_rating * 100.0).round()).abs() < 1e-9));
    assert!(top.iter().all(|b| b.isbn.as_str() != isbn(3)));
    // 8 + 1/3 - 0.04 = 8.29333...
    assert_eq!(top[3].average_rating, 8.29);
}

#[test]
fn every_method_ranks_only_unseen_books() {
    let (_dir, ctx) = fixture();
    for method in ["NormalPredictor", "KNN", "SVD", "SVD++"] {
        let rec = ctx.recommend(method, UserId(1), 10).unwrap();
        let books = rec.books().expect("ranked result");
        assert_eq!(books.len(), 10, "{method}");
        let seen = ctx.dataset().ratings.items_rated_by(UserId(1)).unwrap();
        assert!(books.iter().all(|b| !seen.contains(&b.isbn)), "{method}");
        let scores: Vec<f64> = books.iter().map(|b| b.predicted_rating.unwrap()).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]), "{method}: {scores:?}");
        assert!(scores.iter().all(|s| (1.0..=10.0).contains(s)), "{method}");
    }
}

#[test]
fn guard_counts_unseen_books() {
    let (_dir, ctx) = fixture();
    let unseen = CATALOG_SIZE - 5;
    assert!(ctx.recommend("SVD", UserId(2), unseen).unwrap().books().is_some());
    assert_eq!(
        ctx.recommend("SVD", UserId(2), unseen + 1).unwrap(),
        Recommendation::InsufficientCandidates {
            requested: unseen + 1,
            available: unseen
        }
    );
}

#[test]
fn filtered_out_user_is_treated_as_cold_start() {
    let (_dir, ctx) = fixture();
    let rec = ctx.recommend("SVD++", UserId(4), CATALOG_SIZE).unwrap();
    assert_eq!(rec.books().unwrap().len(), CATALOG_SIZE);
}

#[test]
fn knn_falls_back_for_unknown_users_without_failing() {
    let (_dir, ctx) = fixture();
    let rec = ctx.recommend("KNN", UserId(999), 5).unwrap();
    let books = rec.books().unwrap();
    assert_eq!(books.len(), 5);
    assert!(books.iter().all(|b| b.predicted_rating == Some(7.0)));
}

#[test]
fn unknown_method_is_rejected() {
    let (_dir, ctx) = fixture();
    assert!(ctx.recommend("ALS", UserId(1), 1).is_err());
}

#[test]
fn rendered_outputs() {
    let (_dir, ctx) = fixture();
    let page = html::render_page("Top 20 Recommended Books", &html::render_books(&ctx.top_rated()));
    assert_eq!(page.matches("<h4 ").count(), 20);
    assert!(page.contains("<b>Average Rating:</b> 9.80"));

    let json: serde_json::Value =
        serde_json::from_str(&ffi::recommend_json(&ctx, UserId(3), "svd", 26)).unwrap();
    assert_eq!(json["ok"], false);
    assert_eq!(json["message"], "Please reduce your recommendation request");
}

#[test]
fn missing_model_artefact_fails_startup() {
    let dir = tempfile::tempdir().unwrap();
    write_books(dir.path());
    write_ratings(dir.path());
    write_models(dir.path());
    fs::remove_file(dir.path().join("models").join("knn_model.json")).unwrap();
    let mut cfg = AppCfg::default();
    cfg.set("data_root", &dir.path().display().to_string()).unwrap();
    assert!(AppContext::load(cfg).is_err());
}
