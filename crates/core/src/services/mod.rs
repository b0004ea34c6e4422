pub mod chart_service;
pub mod portfolio_service;
pub mod refresh_service;
pub mod summary_service;
pub mod valuation_service;
