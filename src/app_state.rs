use crate::auth::AuthService;
use crate::config::Config;
use crate::group_service::GroupService;
use crate::repos::{GroupRepo, LabelRepo, NotificationRepo, TaskRepo, UserRepo};
use crate::store::mongo::MongoStore;
use crate::task_service::TaskService;

/// Everything the handlers need, wired once at startup. Repositories
/// serve the plain read paths; the services own every mutation that
/// fans out to notifications.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub users: UserRepo<MongoStore>,
    pub groups: GroupRepo<MongoStore>,
    pub tasks: TaskRepo<MongoStore>,
    pub labels: LabelRepo<MongoStore>,
    pub notifications: NotificationRepo<MongoStore>,
    pub task_service: TaskService<MongoStore>,
    pub group_service: GroupService<MongoStore>,
    pub auth: AuthService<MongoStore>,
}

impl AppState {
    pub fn new(store: MongoStore, config: Config) -> Self {
        let users = UserRepo::new(store.clone());
        let groups = GroupRepo::new(store.clone());
        let tasks = TaskRepo::new(store.clone());
        let labels = LabelRepo::new(store.clone());
        let notifications = NotificationRepo::new(store.clone());
        let task_service =
            TaskService::new(tasks.clone(), groups.clone(), notifications.clone());
        let group_service = GroupService::new(
            groups.clone(),
            notifications.clone(),
            task_service.clone(),
        );
        let auth = AuthService::new(store, config.jwt_secret.clone());

        AppState {
            config,
            users,
            groups,
            tasks,
            labels,
            notifications,
            task_service,
            group_service,
            auth,
        }
    }
}
