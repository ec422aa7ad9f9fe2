mod helpers;
mod idle;
mod websocket;
