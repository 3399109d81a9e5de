//! Integration tests: frames sent over UDP reach the device.

use std::sync::{atomic::AtomicBool, atomic::Ordering, Arc};
use std::time::Duration;

use relay_core::encode_event;
use relay_core::keymap::dom::HidUsage;
use relay_core::protocol::messages::{gamepad_buttons, GamepadAxis, MouseButton};
use relay_core::InputEvent;
use relay_injector::application::{InjectInputUseCase, InjectorRole, InputInjector};
use relay_injector::infrastructure::mock::MockInjector;
use relay_injector::infrastructure::{bind_listener, run_listener, ListenerStats};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

struct Harness {
    injector: Arc<MockInjector>,
    sender: UdpSocket,
    running: Arc<AtomicBool>,
    task: JoinHandle<ListenerStats>,
}

impl Harness {
    async fn start(role: InjectorRole) -> Self {
        let socket = bind_listener("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let addr = socket.local_addr().unwrap();
        let injector = Arc::new(MockInjector::new());
        let use_case = InjectInputUseCase::new(
            Arc::clone(&injector) as Arc<dyn InputInjector>,
            role,
        );
        let running = Arc::new(AtomicBool::new(true));
        let task = tokio::spawn(run_listener(socket, use_case, Arc::clone(&running)));

        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        sender.connect(addr).await.unwrap();
        Self {
            injector,
            sender,
            running,
            task,
        }
    }

    async fn send(&self, datagram: &[u8]) {
        self.sender.send(datagram).await.unwrap();
    }

    async fn send_event(&self, event: InputEvent) {
        self.send(&encode_event(&event).unwrap()).await;
    }

    /// Waits until the mock has recorded `count` calls.
    async fn wait_for_calls(&self, count: usize) {
        for _ in 0..200 {
            if self.injector.call_count() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "expected {count} device calls, saw {}",
            self.injector.call_count()
        );
    }

    async fn stop(self) -> (ListenerStats, Arc<MockInjector>) {
        self.running.store(false, Ordering::Relaxed);
        let stats = tokio::time::timeout(Duration::from_secs(2), self.task)
            .await
            .expect("listener stops")
            .unwrap();
        (stats, self.injector)
    }
}

#[tokio::test]
async fn test_keymouse_frames_are_replayed_in_order() {
    // Arrange
    let h = Harness::start(InjectorRole::KeyMouse).await;

    // Act
    h.send(&[0x01, 0x04, 0x05, 0x00, 0x04, b'K', b'e', b'y', b'A'])
        .await;
    h.send_event(InputEvent::MouseMove { dx: 10, dy: -4 }).await;
    h.send_event(InputEvent::MouseDown {
        button: MouseButton::Left,
    })
    .await;
    h.wait_for_calls(3).await;

    // Assert
    let (stats, injector) = h.stop().await;
    assert_eq!(injector.keys.lock().unwrap()[0].0, HidUsage(0x04));
    assert_eq!(*injector.mouse_moves.lock().unwrap(), vec![(10, -4)]);
    assert_eq!(
        *injector.mouse_buttons.lock().unwrap(),
        vec![(MouseButton::Left, true)]
    );
    assert_eq!(stats.injected, 3);
}

#[tokio::test]
async fn test_bad_datagrams_are_dropped_without_stopping_the_listener() {
    let h = Harness::start(InjectorRole::KeyMouse).await;

    h.send(&[0x01]).await;
    h.send(&[0x02, 0x01, 0x04, 0x00, 1, 0, 1, 0]).await;
    h.send(b"{\"t\":\"mouse\",\"dx\":1,\"dy\":1}\n").await;
    h.send_event(InputEvent::GamepadConnect { connected: true })
        .await;
    h.send_event(InputEvent::MouseWheel { dy: 3 }).await;
    h.wait_for_calls(1).await;

    let (stats, injector) = h.stop().await;
    assert_eq!(*injector.wheels.lock().unwrap(), vec![3]);
    assert!(injector.connections.lock().unwrap().is_empty());
    assert_eq!(stats.dropped, 4);
    assert_eq!(stats.injected, 1);
}

#[tokio::test]
async fn test_gamepad_frames_build_a_report() {
    // Arrange
    let h = Harness::start(InjectorRole::Gamepad).await;

    // Act
    h.send_event(InputEvent::GamepadButtons {
        mask: gamepad_buttons::A | gamepad_buttons::START,
    })
    .await;
    h.send_event(InputEvent::GamepadAxis {
        axis: GamepadAxis::RightX,
        value: -32768,
    })
    .await;
    // plug + two reports
    h.wait_for_calls(3).await;

    // Assert: shutdown unplugs the pad
    let (_, injector) = h.stop().await;
    assert_eq!(*injector.connections.lock().unwrap(), vec![true, false]);
    let reports = injector.pad_reports.lock().unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[1].buttons, 0x1010);
    assert_eq!(reports[1].thumb_rx, i16::MIN);
}

#[tokio::test]
async fn test_held_keys_are_released_on_shutdown() {
    let h = Harness::start(InjectorRole::KeyMouse).await;
    h.send_event(InputEvent::KeyDown {
        code: "AltLeft".to_string(),
    })
    .await;
    h.wait_for_calls(1).await;

    let (_, injector) = h.stop().await;

    let keys = injector.keys.lock().unwrap();
    assert_eq!(keys.len(), 2);
    assert_eq!((keys[1].0, keys[1].1), (HidUsage(0xE2), false));
}
