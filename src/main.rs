fn main() -> Result<(), Box<dyn std::error::Error>> {
    ollama_chat::cli::main()
}
