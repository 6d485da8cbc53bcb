use crate::tracker::TestRunnerService;
use crate::users::UserStore;

#[derive(Clone)]
pub struct AppState {
    pub users: UserStore,
    pub tests: TestRunnerService,
}
