mod lifecycle;
mod ticking;
