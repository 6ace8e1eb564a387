use chrono::Utc;
use research_feed::db::{configure_connection, establish_pool, get_entry, get_ranked};
use research_feed::scoring::{compute_breakdown, stored_or_computed, SimulationOverrides};
use research_feed::settings::Settings;
use research_feed::utils::{
    log_generic_error, log_ranked_entry, log_score_comparison, log_stored_scores, print_breakdown,
};
use std::env;
use std::process;

fn print_usage() {
    eprintln!("Usage: inspect-score <entry-id> [options]");
    eprintln!("       inspect-score --top <n> [--csv <file>]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <path>            SQLite database (default: feed.db or DATABASE_URL)");
    eprintln!("  --top <n>              List the n highest-ranked entries instead");
    eprintln!("  --csv <file>           With --top, also write the listing as CSV");
    eprintln!();
    eprintln!("What-if overrides (any subset; runs actual vs simulated):");
    eprintln!("  --sim-upvotes <n>        Replace the net upvote count");
    eprintln!("  --sim-comments <n>       Replace the comment count");
    eprintln!("  --sim-tips <amount>      Replace the tip total");
    eprintln!("  --sim-bounty <amount>    Replace the open bounty total");
    eprintln!("  --sim-urgent-bounty      Mark the bounty as urgent");
    eprintln!("  --sim-peer-reviews <n>   Replace the peer review count");
    eprintln!("  --sim-altmetric <x>      Replace the altmetric score");
    eprintln!("  --sim-age-hours <hours>  Replace the effective age");
}

struct Args {
    entry_id: Option<i64>,
    database_url: String,
    top: Option<i64>,
    csv: Option<String>,
    overrides: SimulationOverrides,
}

fn parse_args() -> Result<Args, String> {
    let argv: Vec<String> = env::args().skip(1).collect();
    let mut args = Args {
        entry_id: None,
        database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "feed.db".to_string()),
        top: None,
        csv: None,
        overrides: SimulationOverrides::default(),
    };

    let mut i = 0;
    while i < argv.len() {
        let arg = argv[i].as_str();
        let take_value = |i: &mut usize| -> Result<String, String> {
            *i += 1;
            argv.get(*i)
                .cloned()
                .ok_or_else(|| format!("{arg} expects a value"))
        };

        match arg {
            "--db" => args.database_url = take_value(&mut i)?,
            "--top" => {
                args.top = Some(parse_num(arg, &take_value(&mut i)?)?);
            }
            "--csv" => args.csv = Some(take_value(&mut i)?),
            "--sim-upvotes" => {
                args.overrides.upvotes = Some(parse_num(arg, &take_value(&mut i)?)?);
            }
            "--sim-comments" => {
                args.overrides.comments = Some(parse_num(arg, &take_value(&mut i)?)?);
            }
            "--sim-tips" => {
                args.overrides.tip_amount = Some(parse_num(arg, &take_value(&mut i)?)?);
            }
            "--sim-bounty" => {
                args.overrides.bounty_amount = Some(parse_num(arg, &take_value(&mut i)?)?);
            }
            "--sim-urgent-bounty" => args.overrides.urgent_bounty = Some(true),
            "--sim-peer-reviews" => {
                args.overrides.peer_review_count = Some(parse_num(arg, &take_value(&mut i)?)?);
            }
            "--sim-altmetric" => {
                args.overrides.altmetric_score = Some(parse_num(arg, &take_value(&mut i)?)?);
            }
            "--sim-age-hours" => {
                args.overrides.age_hours = Some(parse_num(arg, &take_value(&mut i)?)?);
            }
            _ if args.entry_id.is_none() && !arg.starts_with("--") => {
                args.entry_id = Some(parse_num("entry-id", arg)?);
            }
            _ => return Err(format!("unknown argument: {arg}")),
        }
        i += 1;
    }

    if args.entry_id.is_none() && args.top.is_none() {
        return Err("an entry id or --top is required".into());
    }
    Ok(args)
}

fn parse_num<T: std::str::FromStr>(flag: &str, value: &str) -> Result<T, String> {
    value
        .parse()
        .map_err(|_| format!("{flag}: invalid value '{value}'"))
}

/// Full component table for the ranked listing. Entries without a resolvable
/// content snapshot get empty component columns rather than being dropped.
fn ranked_csv(ranked: &[research_feed::item::FeedItem], settings: &Settings) -> String {
    let now = Utc::now();
    let mut out = String::from(
        "rank,id,hot_score_v2,hot_score,upvote,comment,tip,bounty,peer_review,altmetric,\
         age_hours,freshness,engagement,denominator,title\n",
    );

    for (i, item) in ranked.iter().enumerate() {
        let title = item.title().replace('"', "\"\"");
        let components = match stored_or_computed(item, &settings.scoring, now) {
            Ok(b) => format!(
                "{:.4},{:.4},{:.4},{:.4},{:.4},{:.4},{:.2},{:.2},{:.4},{:.4}",
                b.upvote.component,
                b.comment.component,
                b.tip.component,
                b.bounty.component,
                b.peer_review.component,
                b.altmetric.component,
                b.age_hours,
                b.freshness_multiplier,
                b.engagement_score,
                b.time_denominator
            ),
            Err(_) => ",,,,,,,,,".to_string(),
        };
        out.push_str(&format!(
            "{},{},{},{},{},\"{}\"\n",
            i + 1,
            item.id,
            item.hot_score_v2,
            item.hot_score,
            components,
            title
        ));
    }
    out
}

fn main() {
    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            log_generic_error("[ERROR]", &e);
            eprintln!();
            print_usage();
            process::exit(1);
        }
    };

    let settings = match Settings::load() {
        Ok(s) => s,
        Err(e) => {
            log_generic_error("[ERROR]", &format!("bad settings: {e}"));
            process::exit(1);
        }
    };

    let pool = establish_pool(&args.database_url);
    let mut conn = match pool.get() {
        Ok(c) => c,
        Err(e) => {
            log_generic_error("[ERROR]", &format!("cannot open {}: {e}", args.database_url));
            process::exit(1);
        }
    };
    if let Err(e) = configure_connection(&mut conn) {
        log_generic_error("[ERROR]", &format!("cannot configure connection: {e}"));
        process::exit(1);
    }

    if let Some(limit) = args.top {
        let ranked = match get_ranked(&mut conn, limit) {
            Ok(items) => items,
            Err(e) => {
                log_generic_error("[ERROR]", &format!("query failed: {e}"));
                process::exit(1);
            }
        };

        for (i, item) in ranked.iter().enumerate() {
            log_ranked_entry(i + 1, item);
        }

        if let Some(path) = &args.csv {
            let out = ranked_csv(&ranked, &settings);
            if let Err(e) = std::fs::write(path, out) {
                log_generic_error("[ERROR]", &format!("cannot write {path}: {e}"));
                process::exit(1);
            }
            println!("wrote {} rows to {path}", ranked.len());
        }
        return;
    }

    let entry_id = args.entry_id.unwrap_or_default();
    let item = match get_entry(&mut conn, entry_id) {
        Ok(Some(item)) => item,
        Ok(None) => {
            log_generic_error("[ERROR]", &format!("no entry with id {entry_id}"));
            process::exit(1);
        }
        Err(e) => {
            log_generic_error("[ERROR]", &format!("query failed: {e}"));
            process::exit(1);
        }
    };

    let now = Utc::now();
    let scoring = &settings.scoring;
    log_stored_scores(&item);

    if args.overrides.is_empty() {
        // No simulation: show the stored snapshot when one exists, so the
        // view matches what the feed is actually ranked by.
        match stored_or_computed(&item, scoring, now) {
            Ok(breakdown) => print_breakdown(&item, &breakdown, "SCORE BREAKDOWN"),
            Err(e) => {
                log_generic_error("[ERROR]", &e.to_string());
                process::exit(1);
            }
        }
        return;
    }

    // Simulation always compares against a fresh computation; a stale stored
    // snapshot would make the delta meaningless.
    let actual = match compute_breakdown(&item, scoring, now, None) {
        Ok(b) => b,
        Err(e) => {
            log_generic_error("[ERROR]", &e.to_string());
            process::exit(1);
        }
    };
    let simulated = match compute_breakdown(&item, scoring, now, Some(&args.overrides)) {
        Ok(b) => b,
        Err(e) => {
            log_generic_error("[ERROR]", &e.to_string());
            process::exit(1);
        }
    };

    print_breakdown(&item, &actual, "ACTUAL");
    print_breakdown(&item, &simulated, "SIMULATED");
    log_score_comparison(actual.final_score(), simulated.final_score());
}
