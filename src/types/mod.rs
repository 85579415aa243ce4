pub mod bbox;
pub mod feature;
pub mod lat_lon;
pub mod month;
