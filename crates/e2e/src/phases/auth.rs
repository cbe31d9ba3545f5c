//! Registration, login and token refresh for both actors.
//!
//! A failed register or login status ends the run. A login that succeeds but
//! carries no usable token only leaves the token unset; later phases skip.

use serde_json::json;
use tracing::info;

use super::{Continuation, PhaseRun};
use crate::context::{Actor, ContextField};
use crate::probe::{ApiRequest, Expect};

pub(super) async fn run(run: &mut PhaseRun<'_>) -> Continuation {
    for actor in [Actor::A, Actor::B] {
        if bootstrap(run, actor).await == Continuation::Abort {
            return Continuation::Abort;
        }
    }
    refresh(run, Actor::A).await;
    Continuation::Continue
}

async fn bootstrap(run: &mut PhaseRun<'_>, actor: Actor) -> Continuation {
    let username = format!("{}_{}_{}", run.config.user_prefix, actor.slug(), run.stamp);
    let email = format!("user_{}_{}@{}", actor.slug(), run.stamp, run.config.email_domain);
    let password = run.config.password.clone();

    let register = ApiRequest::post("/auth/register").json(json!({
        "username": username,
        "email": email,
        "password": password,
    }));
    let name = format!("Register {}", actor.label());
    if !run.check(&name, register, Expect::ok()).await.passed() {
        return Continuation::Abort;
    }
    run.ctx.set_username(actor, Some(username.clone()));

    let login = ApiRequest::post("/auth/login").json(json!({
        "username": username,
        "password": password,
    }));
    let name = format!("Login {}", actor.label());
    let exchange = run
        .check_with(&name, login, Expect::ok(), |ex| {
            Ok(match ex.json_str("/accessToken") {
                Some(token) => format!("Token: {}...", token.chars().take(20).collect::<String>()),
                None => "no access token in response".to_string(),
            })
        })
        .await;
    if !exchange.passed() {
        return Continuation::Abort;
    }

    run.ctx.set_token(actor, exchange.json_str("/accessToken"));
    run.ctx.set_refresh_token(actor, exchange.json_str("/refreshToken"));
    run.ctx.set_user_id(actor, exchange.json_i64("/userId"));
    info!(actor = actor.label(), user_id = ?run.ctx.user_id(actor), "actor logged in");
    Continuation::Continue
}

async fn refresh(run: &mut PhaseRun<'_>, actor: Actor) {
    let name = "Refresh Access Token";
    if !run.require(name, &[ContextField::RefreshToken(actor)]) {
        return;
    }
    let request = ApiRequest::post("/auth/refresh").json(json!({
        "refreshToken": run.ctx.refresh_token(actor),
    }));
    let exchange = run
        .check_with(name, request, Expect::ok(), |ex| {
            if ex.json_str("/accessToken").is_some() {
                Ok("New token received".to_string())
            } else {
                Ok("refresh accepted without a new access token".to_string())
            }
        })
        .await;
    if exchange.passed() {
        run.ctx.set_token(actor, exchange.json_str("/accessToken"));
        run.ctx.set_refresh_token(actor, exchange.json_str("/refreshToken"));
    }
}
