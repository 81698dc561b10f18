use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use anb_core::{
    config::Config,
    ports::{DeliveryPort, StoragePort},
    relay::RelayEngine,
    session::UserLocks,
    store::MemoryStore,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub engine: Arc<RelayEngine>,
    pub store: Arc<dyn StoragePort>,
    pub messenger: Arc<TelegramMessenger>,
    pub user_locks: Arc<UserLocks>,
}

pub async fn run_polling(cfg: Arc<Config>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.bot_token.clone());

    // Basic startup info.
    if let Ok(me) = bot.get_me().await {
        tracing::info!(username = %me.username(), "anb started");
    }
    tracing::info!(
        admins = cfg.admin_ids.len(),
        policy = ?cfg.session_policy,
        "configuration loaded"
    );

    let messenger = Arc::new(TelegramMessenger::new(bot.clone()));
    let store: Arc<dyn StoragePort> = Arc::new(MemoryStore::new());
    let delivery: Arc<dyn DeliveryPort> = messenger.clone();
    let engine = Arc::new(RelayEngine::new(&cfg, store.clone(), delivery));

    let state = Arc::new(AppState {
        cfg,
        engine,
        store,
        messenger,
        user_locks: Arc::new(UserLocks::default()),
    });

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
