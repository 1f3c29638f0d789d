// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{error::Error, net::SocketAddr, sync::Arc};

use tracing::{info, warn};

use viasegura_auth::{
    accounts::{AccountError, AccountService},
    api::router,
    auth::roles::ADMIN_ROLE,
    config::AppConfig,
    logging::init_logging,
    models::User,
    password::Argon2PasswordEncoder,
    server::serve_until,
    state::AppState,
    store::InMemoryUserStore,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = AppConfig::from_env()?;
    init_logging(config.log_format)?;

    let state = AppState::from_config(
        &config,
        Arc::new(InMemoryUserStore::new()),
        Arc::new(Argon2PasswordEncoder),
    )?;

    if let Some(email) = &config.seed_admin_email {
        seed_admin(&state, email)?;
    }
    if let Some(oauth) = &config.oauth {
        info!(provider = %oauth.provider, "Federated login enabled");
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let app = router(state);

    info!(%addr, origin = %config.server.public_origin, "ViaSegura auth listening (docs at /docs)");
    serve_until(addr, app, ctrl_c()).await?;

    info!("Server stopped");
    Ok(())
}

fn seed_admin(state: &AppState, email: &str) -> Result<(), AccountError> {
    let accounts = AccountService::new(state.store.as_ref(), state.encoder.as_ref());
    match accounts.create_by_admin(User::new(email, String::new(), vec![ADMIN_ROLE.to_string()])) {
        Ok(user) => {
            info!(user_id = %user.id, "Seeded administrator account");
            Ok(())
        }
        Err(AccountError::DuplicateRegistration(_)) => {
            warn!("Administrator account already present, skipping seed");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        // Without a signal source, run until killed.
        std::future::pending::<()>().await;
    }
}
