//! 摄像头注册表、命令菜单与启动器集成测试

mod common;

use common::{camera_config, idle_camera, short_timeouts, MockService};
use hikcam_services::cli::commands::ServicesCommand;
use hikcam_services::common::menu::{camera_commands, render_menu};
use hikcam_services::config::{Config, GlobalConfig};
use hikcam_services::constants::CommandSection;
use hikcam_services::core::{CameraRegistry, ServiceLauncher, ServiceSupervisor};
use hikcam_services::error::CamServicesError;
use hikcam_services::service::Service;
use hikcam_services::camera::Camera;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

fn supervisor_with_mocks(id: &str) -> (ServiceSupervisor, Arc<MockService>) {
    let camera = idle_camera(id);
    let mock = Arc::new(MockService::new("MockService", Arc::clone(&camera)));
    let mut supervisor = ServiceSupervisor::new(camera);
    supervisor.add_service(mock.clone());
    (supervisor, mock)
}

#[tokio::test]
async fn test_registry_register_starts_enabled_services() {
    let registry = CameraRegistry::new(short_timeouts());

    let report = registry.register(idle_camera("cam_1")).await.unwrap();
    assert!(report.is_ok());
    assert_eq!(report.succeeded.len(), 2);

    let supervisor = registry.get("cam_1").await.unwrap();
    assert_eq!(supervisor.status().running_services(), 2);
    assert_eq!(registry.camera_ids().await, vec!["cam_1".to_string()]);

    registry.shutdown().await;
    assert_eq!(supervisor.status().running_services(), 0);
}

#[tokio::test]
async fn test_registry_rejects_duplicate_camera() {
    let registry = CameraRegistry::new(short_timeouts());
    registry.register(idle_camera("cam_1")).await.unwrap();

    let err = registry.register(idle_camera("cam_1")).await.unwrap_err();
    assert!(matches!(err, CamServicesError::DuplicateCamera(ref id) if id == "cam_1"));

    registry.shutdown().await;
}

#[tokio::test]
async fn test_registry_remove_stops_camera() {
    let registry = CameraRegistry::new(short_timeouts());
    let (supervisor, mock) = supervisor_with_mocks("cam_1");
    registry.register_supervisor(supervisor).await.unwrap();
    assert!(mock.started());

    let report = registry.remove("cam_1").await.unwrap();
    assert!(report.is_ok());
    assert!(!mock.started());
    assert!(registry.get("cam_1").await.is_none());

    assert!(registry.remove("cam_1").await.is_none());
}

#[tokio::test]
async fn test_registry_shutdown_stops_all_cameras() {
    let registry = CameraRegistry::new(short_timeouts());
    let (first, first_mock) = supervisor_with_mocks("cam_1");
    let (second, second_mock) = supervisor_with_mocks("cam_2");
    registry.register_supervisor(first).await.unwrap();
    registry.register_supervisor(second).await.unwrap();

    let statuses = registry.status().await;
    assert_eq!(statuses.len(), 2);
    assert!(statuses.iter().all(|s| s.running_services() == 1));

    let report = registry.shutdown().await;
    assert_eq!(report.succeeded.len(), 2);
    assert!(!first_mock.started());
    assert!(!second_mock.started());
}

/// 统计 ERROR 级别日志条数
struct ErrorCounter(Arc<AtomicUsize>);

impl<S: Subscriber> Layer<S> for ErrorCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::ERROR {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[tokio::test]
async fn test_each_failure_logged_once() {
    let errors = Arc::new(AtomicUsize::new(0));
    let subscriber = tracing_subscriber::registry().with(ErrorCounter(errors.clone()));
    let _guard = tracing::subscriber::set_default(subscriber);

    let camera = idle_camera("cam_1");
    let broken = Arc::new(MockService::new("Broken", Arc::clone(&camera)).failing_start());
    let leaky = Arc::new(MockService::new("Leaky", Arc::clone(&camera)).failing_stop());
    let mut supervisor = ServiceSupervisor::new(camera);
    supervisor.add_service(broken);
    supervisor.add_service(leaky);

    let registry = CameraRegistry::new(short_timeouts());
    let started = registry.register_supervisor(supervisor).await.unwrap();
    assert_eq!(started.failed.len(), 1);
    assert_eq!(errors.load(Ordering::SeqCst), 1);

    let stopped = registry.shutdown().await;
    assert_eq!(stopped.failed.len(), 1);
    assert_eq!(errors.load(Ordering::SeqCst), 2);
}

#[test]
fn test_menu_follows_enabled_services() {
    let camera = idle_camera("cam_1");
    let (alerts, _) = broadcast::channel(1);
    let supervisor = ServiceSupervisor::for_camera(Arc::clone(&camera), short_timeouts(), alerts);

    let commands = camera_commands(&camera, supervisor.services());
    let section = |wanted: CommandSection| {
        commands
            .iter()
            .find(|(s, _)| *s == wanted)
            .map(|(_, cmds)| cmds.clone())
            .unwrap()
    };

    assert_eq!(section(CommandSection::General), vec!["cmds_cam_1", "status_cam_1"]);
    assert_eq!(section(CommandSection::Alert), vec!["alert_on_cam_1", "alert_off_cam_1"]);
    assert_eq!(
        section(CommandSection::Stream),
        vec!["stream_direct_on_cam_1", "stream_direct_off_cam_1"]
    );

    let menu = render_menu(&camera, supervisor.services());
    assert!(menu.starts_with("General Commands\n/cmds_cam_1"));
    assert!(menu.contains("/alert_on_cam_1"));
    assert!(!menu.contains("dvr"));
}

#[test]
fn test_menu_hides_invisible_sections() {
    let mut config = camera_config("cam_1");
    config.command_sections_visibility.alert = false;
    let camera = Arc::new(Camera::new(config, Arc::new(common::IdleClient)));
    let (alerts, _) = broadcast::channel(1);
    let supervisor = ServiceSupervisor::for_camera(Arc::clone(&camera), short_timeouts(), alerts);

    let menu = render_menu(&camera, supervisor.services());
    assert!(menu.contains("/status_cam_1"));
    assert!(menu.contains("/stream_direct_on_cam_1"));
    assert!(!menu.contains("alert_on"));
}

fn offline_config() -> Config {
    let mut camera = camera_config("cam_1");
    camera.alert.enabled = false;
    camera.streams.direct = None;
    Config {
        global: GlobalConfig::default(),
        cameras: vec![camera],
    }
}

#[test]
fn test_services_listing_does_not_start_services() {
    let config = Config {
        global: GlobalConfig::default(),
        cameras: vec![camera_config("cam_1"), camera_config("cam_2")],
    };

    let listings = ServicesCommand.list_services(&config, None).unwrap();
    assert_eq!(listings.len(), 2);
    assert!(listings.iter().all(|l| l.status.running_services() == 0));

    let filtered = ServicesCommand.list_services(&config, Some("cam_2")).unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].status.id, "cam_2");
    assert!(filtered[0].menu.contains("/alert_on_cam_2"));

    assert!(ServicesCommand.list_services(&config, Some("missing")).is_err());
}

#[tokio::test]
async fn test_launcher_runs_until_shutdown() {
    let config = offline_config();
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let run = tokio::spawn(async move {
        ServiceLauncher::run_until_shutdown(&config, shutdown_rx).await
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown_tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_build_registry_registers_every_camera() {
    let mut config = offline_config();
    let mut second = config.cameras[0].clone();
    second.id = "cam_2".to_string();
    config.cameras.push(second);

    let registry = ServiceLauncher::build_registry(&config).await.unwrap();
    assert_eq!(registry.camera_ids().await, vec!["cam_1", "cam_2"]);

    let supervisor = registry.get("cam_2").await.unwrap();
    assert!(supervisor.services().iter().all(|s| !s.started()));
}
