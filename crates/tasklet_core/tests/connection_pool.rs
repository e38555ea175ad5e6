use tasklet_core::{
    connect, ConnectionProvider, ConnectionString, ConnectionStringError, DbError, DirectProvider,
    PoolState, PooledProvider, RepoError, SqliteTaskRepository, Task, TaskRepository,
};

fn file_url(dir: &tempfile::TempDir, options: &str) -> String {
    format!(
        "jdbc:sqlite:{}{options}",
        dir.path().join("tasks.db").display()
    )
}

#[test]
fn connect_builds_a_migrated_pool() {
    let dir = tempfile::tempdir().unwrap();
    let provider = connect(&file_url(&dir, ";POOL_MAX_SIZE=2;POOL_MIN_IDLE=1")).unwrap();

    assert_eq!(provider.connection_string().settings.pool_max_size, 2);
    let repo = SqliteTaskRepository::new(provider);
    repo.create(&Task::new("pooled")).unwrap();
    assert_eq!(repo.count().unwrap(), 1);
}

#[test]
fn connect_rejects_other_store_types() {
    let err = connect("jdbc:h2:./todo;AUTO_SERVER=TRUE").err().unwrap();
    assert!(matches!(
        err,
        DbError::ConnectionString(ConnectionStringError::UnsupportedStore(ref kind)) if kind == "h2"
    ));
}

#[test]
fn unreachable_store_is_a_connectivity_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("no-such-dir").join("tasks.db");

    let pooled = connect(&format!(
        "sqlite:{};CONNECT_TIMEOUT_MS=200;POOL_MAX_SIZE=1",
        missing.display()
    ));
    assert!(matches!(pooled.err(), Some(DbError::Pool(_))));

    let direct = DirectProvider::new(&missing).acquire();
    assert!(matches!(direct.err(), Some(DbError::Sqlite(_))));
}

#[test]
fn handles_are_independent_and_returned_on_drop() {
    let dir = tempfile::tempdir().unwrap();
    let provider = connect(&file_url(&dir, ";POOL_MAX_SIZE=2")).unwrap();

    {
        let first = provider.acquire().unwrap();
        let second = provider.acquire().unwrap();
        first.execute_batch("SELECT 1;").unwrap();
        second.execute_batch("SELECT 1;").unwrap();
        assert_eq!(
            provider.state(),
            PoolState {
                connections: 2,
                idle_connections: 0
            }
        );
    }

    assert_eq!(provider.state().idle_connections, 2);
}

#[test]
fn failed_statement_still_releases_its_connection() {
    let repo = SqliteTaskRepository::new(PooledProvider::in_memory().unwrap());
    {
        let conn = repo.provider().acquire().unwrap();
        conn.execute_batch("DROP TABLE tasks;").unwrap();
    }

    let err = repo.create(&Task::new("lost")).unwrap_err();
    assert!(matches!(err, RepoError::Db(DbError::Sqlite(_))));
    assert_eq!(repo.provider().state().idle_connections, 1);

    {
        let conn = repo.provider().acquire().unwrap();
        conn.execute_batch("CREATE TABLE tasks (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL);")
            .unwrap();
    }
    repo.create(&Task::new("found")).unwrap();
    assert_eq!(repo.count().unwrap(), 1);
}

#[test]
fn in_memory_pool_keeps_data_between_calls() {
    let repo = SqliteTaskRepository::new(PooledProvider::in_memory().unwrap());

    repo.create(&Task::new("persisted in memory")).unwrap();
    repo.create(&Task::new("still here")).unwrap();

    assert_eq!(repo.count().unwrap(), 2);
    assert_eq!(repo.provider().state().connections, 1);
}

#[test]
fn direct_provider_opens_a_connection_per_call() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("direct.db");
    let direct = SqliteTaskRepository::new(DirectProvider::new(&path));

    let id = direct.create(&Task::new("written directly")).unwrap();
    assert!(direct.update(&Task::with_id(id, "renamed directly")).unwrap());

    let pooled = SqliteTaskRepository::new(
        PooledProvider::build(&ConnectionString::file(&path)).unwrap(),
    );
    assert_eq!(
        pooled.find_all().unwrap(),
        vec![Task::with_id(id, "renamed directly")]
    );
}

#[test]
fn direct_provider_rejects_memory_stores() {
    let err = DirectProvider::from_connection_string(&ConnectionString::memory()).unwrap_err();
    assert!(matches!(err, DbError::UnsupportedMemoryStore));
}

#[test]
fn repository_can_borrow_a_shared_provider() {
    let provider = PooledProvider::in_memory().unwrap();
    let writer = SqliteTaskRepository::new(&provider);
    let reader = SqliteTaskRepository::new(&provider);

    writer.create(&Task::new("shared")).unwrap();

    assert_eq!(reader.count().unwrap(), 1);
}

#[test]
fn pooled_repository_is_shareable_across_threads() {
    let dir = tempfile::tempdir().unwrap();
    let repo = SqliteTaskRepository::new(connect(&file_url(&dir, ";POOL_MAX_SIZE=4")).unwrap());

    std::thread::scope(|scope| {
        for worker in 0..4 {
            let repo = &repo;
            scope.spawn(move || {
                for item in 0..10 {
                    repo.create(&Task::new(format!("worker {worker} item {item}")))
                        .unwrap();
                }
            });
        }
    });

    assert_eq!(repo.count().unwrap(), 40);
}

#[test]
fn oversized_busy_timeout_is_rejected_before_any_connection_opens() {
    let dir = tempfile::tempdir().unwrap();
    let url = file_url(&dir, ";BUSY_TIMEOUT_MS=3000000000");

    let err = connect(&url).err().unwrap();
    assert!(matches!(
        err,
        DbError::ConnectionString(ConnectionStringError::InvalidOptionValue {
            option: "BUSY_TIMEOUT_MS",
            ..
        })
    ));
    assert!(!dir.path().join("tasks.db").exists());
}

#[test]
fn out_of_bounds_settings_built_in_code_are_errors() {
    let dir = tempfile::tempdir().unwrap();

    let mut empty_pool = ConnectionString::file(dir.path().join("a.db"));
    empty_pool.settings.pool_max_size = 0;
    assert!(matches!(
        PooledProvider::build(&empty_pool).err(),
        Some(DbError::ConnectionString(_))
    ));

    let mut idle_over_max = ConnectionString::file(dir.path().join("b.db"));
    idle_over_max.settings.pool_max_size = 1;
    idle_over_max.settings.pool_min_idle = Some(2);
    assert!(matches!(
        PooledProvider::build(&idle_over_max).err(),
        Some(DbError::ConnectionString(_))
    ));

    let mut no_wait = ConnectionString::file(dir.path().join("c.db"));
    no_wait.settings.connect_timeout = std::time::Duration::ZERO;
    assert!(matches!(
        PooledProvider::build(&no_wait).err(),
        Some(DbError::ConnectionString(_))
    ));

    let mut long_busy = ConnectionString::file(dir.path().join("d.db"));
    long_busy.settings.busy_timeout = std::time::Duration::from_millis(3_000_000_000);
    assert!(matches!(
        DirectProvider::from_connection_string(&long_busy).unwrap_err(),
        DbError::ConnectionString(_)
    ));
}
