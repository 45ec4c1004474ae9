use memalloc::{Handle, Pool};

fn log_block(pool: &Pool, name: &str, handle: Handle) {
    if let Some(block) = pool.get(handle) {
        println!(
            "{name}: {} bytes at {:?} (free: {})",
            block.size(),
            block.addr(),
            block.is_free()
        );
    }
}

fn main() -> memalloc::Result<()> {
    env_logger::init();

    let mut pool = Pool::new();

    let a = pool.allocate(10)?;
    let b = pool.allocate(20)?;
    let c = pool.allocate(30)?;
    log_block(&pool, "a", a);
    log_block(&pool, "b", b);
    log_block(&pool, "c", c);

    println!("Releasing b");
    pool.release(b);

    let reused = pool.acquire(15)?;
    log_block(&pool, "acquire(15)", reused);
    println!("Should be b: {}", reused == b);

    let d = pool.acquire(25)?;
    log_block(&pool, "acquire(25)", d);

    println!(
        "Pool holds {} blocks, {} bytes",
        pool.len(),
        pool.owned_bytes()
    );

    pool.release_all();
    println!("After release_all: {} blocks", pool.len());

    Ok(())
}
