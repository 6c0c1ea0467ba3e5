fn main() {
    speiseplan_lib::run()
}
