use std::net::{TcpListener, TcpStream};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use tungstenite::WebSocket;

use crate::error::WatchError;
use crate::task::Signal;

impl Signal {
    fn as_message(&self) -> String {
        match self {
            Signal::Reload => "reload".to_string(),
            Signal::Styles(path) => format!("styles:{path}"),
        }
    }
}

/// Best-effort broadcast channel to connected browsers. Sending never
/// blocks a task and never fails it.
pub(crate) struct ReloadHub {
    tx: Sender<Signal>,
}

impl ReloadHub {
    pub(crate) fn send(&self, signal: Signal) {
        let _ = self.tx.send(signal);
    }

    #[cfg(test)]
    pub(crate) fn detached() -> Arc<Self> {
        let (tx, _rx) = mpsc::channel();
        Arc::new(Self { tx })
    }
}

/// Reserve the websocket port and spawn the accept and broadcast threads.
pub(crate) fn start() -> Result<(Arc<ReloadHub>, u16), WatchError> {
    let (tcp, port) = reserve_port()?;
    let clients = Arc::new(Mutex::new(vec![]));

    let _incoming = new_thread_ws_incoming(tcp, clients.clone());
    let (tx, _broadcast) = new_thread_ws_broadcast(clients);

    Ok((Arc::new(ReloadHub { tx }), port))
}

fn reserve_port() -> Result<(TcpListener, u16), WatchError> {
    let listener = match TcpListener::bind("127.0.0.1:1337") {
        Ok(sock) => sock,
        Err(_) => TcpListener::bind("127.0.0.1:0").map_err(WatchError::Io)?,
    };

    let addr = listener.local_addr().map_err(WatchError::Io)?;
    let port = addr.port();
    Ok((listener, port))
}

fn new_thread_ws_incoming(
    server: TcpListener,
    clients: Arc<Mutex<Vec<WebSocket<TcpStream>>>>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for stream in server.incoming() {
            let Ok(stream) = stream else { continue };

            match tungstenite::accept(stream) {
                Ok(socket) => clients.lock().unwrap().push(socket),
                Err(e) => tracing::debug!("websocket handshake failed: {e}"),
            }
        }
    })
}

fn new_thread_ws_broadcast(
    clients: Arc<Mutex<Vec<WebSocket<TcpStream>>>>,
) -> (Sender<Signal>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel::<Signal>();

    let thread = std::thread::spawn(move || {
        while let Ok(signal) = rx.recv() {
            let message = signal.as_message();
            let mut clients = clients.lock().unwrap();
            let mut broken = vec![];

            for (i, socket) in clients.iter_mut().enumerate() {
                match socket.send(message.clone().into()) {
                    Ok(_) => {}
                    Err(tungstenite::error::Error::Io(e)) => {
                        if e.kind() == std::io::ErrorKind::BrokenPipe {
                            broken.push(i);
                        }
                    }
                    Err(e) => {
                        tracing::error!("websocket send failed: {e:?}");
                    }
                }
            }

            for i in broken.into_iter().rev() {
                clients.remove(i);
            }

            // Close all but the last 10 connections
            let len = clients.len();
            if len > 10 {
                for mut socket in clients.drain(0..len - 10) {
                    socket.close(None).ok();
                }
            }
        }
    });

    (tx, thread)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signals_format_as_channel_messages() {
        assert_eq!(Signal::Reload.as_message(), "reload");
        assert_eq!(
            Signal::Styles("css/styles.min.css".into()).as_message(),
            "styles:css/styles.min.css"
        );
    }

    #[test]
    fn detached_hub_swallows_signals() {
        let hub = ReloadHub::detached();
        hub.send(Signal::Reload);
    }
}
