pub mod traits;

// Quote/FX source implementations
pub mod ft_markets;
