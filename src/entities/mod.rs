pub mod pago;
pub mod pago_item;
pub mod session;
pub mod usuario;
