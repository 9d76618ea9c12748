mod os;
mod pipeline;
mod ports;
mod services;
