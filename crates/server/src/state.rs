use std::sync::Arc;

use db::DBService;
use services::services::{
    bookings::BookingService,
    config::Config,
    contact::ContactService,
    form_store::PgFormStore,
    imagekit::{ImageKitClient, ImageKitError, MediaLibrary},
    mailer::{Mailer, MailerError},
    media_browser::MediaBrowser,
    portfolio_catalog::PortfolioCatalog,
    portfolio_store::{PgPortfolioStore, PortfolioStore},
    portfolio_sync::PortfolioSync,
    portfolio_webhook::PortfolioWebhook,
    rate_limiter::RateLimiter,
    vouchers::VoucherService,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("image host client: {0}")]
    ImageKit(#[from] ImageKitError),
    #[error("mailer: {0}")]
    Mailer(#[from] MailerError),
}

/// Everything a handler can reach. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub bookings: BookingService,
    pub contact: ContactService,
    pub vouchers: VoucherService,
    pub catalog: PortfolioCatalog,
    pub sync: Arc<PortfolioSync>,
    pub webhook: Arc<PortfolioWebhook>,
    pub media: Arc<MediaBrowser>,
    pub form_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(config: Config, db: DBService) -> Result<Self, StateError> {
        let mailer = Arc::new(Mailer::from_config(&config.email)?);
        let library: Arc<dyn MediaLibrary> = Arc::new(ImageKitClient::from_config(&config.imagekit)?);
        Ok(Self::with_library(config, db, mailer, library))
    }

    /// Wires the services around an existing mailer and media library.
    pub fn with_library(
        config: Config,
        db: DBService,
        mailer: Arc<Mailer>,
        library: Arc<dyn MediaLibrary>,
    ) -> Self {
        let pool = db.pool;
        let root = &config.imagekit.portfolio_root;
        let public_url = &config.imagekit.public_url;

        let store: Arc<dyn PortfolioStore> = Arc::new(PgPortfolioStore::new(pool.clone()));
        let forms = Arc::new(PgFormStore::new(pool));
        let catalog = PortfolioCatalog::new(store.clone(), config.catalog_cache_ttl);

        let sync = PortfolioSync::new(store.clone(), library.clone(), root, public_url)
            .with_catalog(catalog.clone());
        let webhook = PortfolioWebhook::new(store, root, public_url).with_catalog(catalog.clone());
        let media = MediaBrowser::new(library, root, public_url);
        let form_limiter = RateLimiter::new(config.form_rate_limit, config.form_rate_window);

        Self {
            bookings: BookingService::new(forms.clone(), mailer.clone()),
            contact: ContactService::new(forms.clone(), mailer.clone()),
            vouchers: VoucherService::new(forms, mailer),
            catalog,
            sync: Arc::new(sync),
            webhook: Arc::new(webhook),
            media: Arc::new(media),
            form_limiter: Arc::new(form_limiter),
            config: Arc::new(config),
        }
    }
}
